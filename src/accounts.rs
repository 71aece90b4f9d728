//! Registration and passenger maintenance, including create-or-reuse
//! address deduplication and orphaned-address cleanup.

use serde::Serialize;

use crate::errors::CoreError;
use crate::models::*;
use crate::store::Store;
use crate::timefmt;

pub const GENDERS: &[&str] = &["female", "male", "other"];

#[derive(Debug, Serialize)]
pub struct RegistrationOutcome {
    pub user_id: i32,
    pub passenger_id: i32,
    pub group_id: i32,
    pub addr_id: i32,
}

/// Returns the id of an address row structurally equal to `fields`,
/// inserting one when none exists. NULL optional fields compare equal
/// to NULL.
pub fn find_or_create_address<S: Store>(
    store: &mut S,
    fields: &NewAddress,
) -> Result<i32, CoreError> {
    validate_address(fields)?;
    if let Some(addr_id) = store.find_address(fields)? {
        return Ok(addr_id);
    }
    store.insert_address(fields)
}

/// Deletes the address when nothing references it any more. Must run after
/// the referencing passenger has been repointed or removed, inside the same
/// transaction, so the transition window cannot orphan or double-delete.
pub fn release_address_if_orphaned<S: Store>(
    store: &mut S,
    addr_id: i32,
) -> Result<bool, CoreError> {
    if store.passengers_at_address(addr_id)? > 0 {
        return Ok(false);
    }
    if store.ports_at_address(addr_id)? > 0 {
        return Ok(false);
    }
    store.delete_address(addr_id)?;
    Ok(true)
}

/// Creates the user, deduplicated address, travel group and passenger rows
/// for a new registration in one transaction. The caller hashes the
/// password; the core never sees the plaintext.
pub fn register_passenger<S: Store>(
    store: &mut S,
    req: &RegistrationRequest,
    password_hash: &str,
) -> Result<RegistrationOutcome, CoreError> {
    validate_registration(req)?;
    let birth_date = timefmt::parse_timestamp(&req.birth_date)?;
    store.in_transaction(|s| {
        if s.username_or_email_taken(&req.username, &req.email)? {
            return Err(CoreError::Conflict(
                "username or email already exists".to_string(),
            ));
        }
        let user_id = s.insert_user(&NewUser {
            username: req.username.clone(),
            password_hash: password_hash.to_string(),
            email: req.email.clone(),
            user_type: Role::Passenger.as_str().to_string(),
        })?;
        let addr_id = find_or_create_address(s, &req.address())?;
        let group_id = match req.group_id {
            Some(group_id) => {
                if !s.group_exists(group_id)? {
                    return Err(CoreError::NotFound(format!(
                        "travel group {} not found",
                        group_id
                    )));
                }
                group_id
            }
            // No group given: allocate a fresh single-member party.
            None => s.allocate_group()?,
        };
        let passenger_id = s.insert_passenger(&NewPassenger {
            user_id,
            addr_id,
            group_id,
            first_name: req.first_name.clone(),
            last_name: req.last_name.clone(),
            birth_date,
            gender: req.gender.clone(),
            nationality: req.nationality.clone(),
            phone: req.phone.clone(),
        })?;
        Ok(RegistrationOutcome {
            user_id,
            passenger_id,
            group_id,
            addr_id,
        })
    })
}

/// Updates a passenger's contact details. The replacement address is
/// deduplicated first, the passenger repointed, and only then is the old
/// address checked for orphaning.
pub fn edit_passenger<S: Store>(
    store: &mut S,
    identity: &Identity,
    passenger_id: i32,
    req: &PassengerUpdateRequest,
) -> Result<(), CoreError> {
    if req.first_name.trim().is_empty() || req.last_name.trim().is_empty() {
        return Err(CoreError::InvalidInput(
            "first and last name must not be empty".to_string(),
        ));
    }
    store.in_transaction(|s| {
        let passenger = s.passenger(passenger_id)?.ok_or_else(|| {
            CoreError::NotFound(format!("passenger {} not found", passenger_id))
        })?;
        if !identity.can_act_for(passenger.user_id) {
            return Err(CoreError::Unauthorized(
                "you may only edit your own passenger record".to_string(),
            ));
        }
        let old_addr_id = passenger.addr_id;
        let addr_id = find_or_create_address(s, &req.address())?;
        s.update_passenger_contact(
            passenger_id,
            &PassengerContactUpdate {
                first_name: req.first_name.clone(),
                last_name: req.last_name.clone(),
                phone: req.phone.clone(),
                addr_id,
            },
        )?;
        if addr_id != old_addr_id {
            release_address_if_orphaned(s, old_addr_id)?;
        }
        Ok(())
    })
}

/// Admin removal of a passenger: deletes the passenger and its user
/// account, then garbage-collects the address.
pub fn remove_passenger<S: Store>(
    store: &mut S,
    identity: &Identity,
    passenger_id: i32,
) -> Result<(), CoreError> {
    identity.require_admin()?;
    store.in_transaction(|s| {
        let passenger = s.passenger(passenger_id)?.ok_or_else(|| {
            CoreError::NotFound(format!("passenger {} not found", passenger_id))
        })?;
        s.delete_passenger(passenger_id)?;
        s.delete_user(passenger.user_id)?;
        release_address_if_orphaned(s, passenger.addr_id)?;
        Ok(())
    })
}

fn validate_address(fields: &NewAddress) -> Result<(), CoreError> {
    let required = [
        ("street", &fields.street),
        ("city", &fields.city),
        ("state_province", &fields.state_province),
        ("postal_code", &fields.postal_code),
        ("country", &fields.country),
    ];
    for (name, value) in required {
        if value.trim().is_empty() {
            return Err(CoreError::InvalidInput(format!(
                "address field '{}' must not be empty",
                name
            )));
        }
    }
    Ok(())
}

fn validate_registration(req: &RegistrationRequest) -> Result<(), CoreError> {
    let required = [
        ("username", &req.username),
        ("email", &req.email),
        ("first_name", &req.first_name),
        ("last_name", &req.last_name),
        ("nationality", &req.nationality),
        ("phone", &req.phone),
    ];
    for (name, value) in required {
        if value.trim().is_empty() {
            return Err(CoreError::InvalidInput(format!(
                "field '{}' must not be empty",
                name
            )));
        }
    }
    if !GENDERS.contains(&req.gender.as_str()) {
        return Err(CoreError::InvalidInput(
            "gender must be one of female, male, other".to_string(),
        ));
    }
    Ok(())
}
