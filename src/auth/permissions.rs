use log::warn;

use crate::{app::AppError, database::models::user::User};

/// A row that belongs to exactly one user.
pub trait Owned {
    fn owner_id(&self) -> i32;
}

/// Whether `requester` may modify or delete `resource`: only its owner can.
pub fn can_modify<R: Owned + ?Sized>(requester: &User, resource: &R) -> bool {
    requester.id == resource.owner_id()
}

/// [can_modify] as a request guard. Callers look the resource up first, so an
/// absent id is `NotFound` and a foreign one is `PermissionDenied`.
pub fn ensure_can_modify<R: Owned + ?Sized>(
    requester: &User,
    resource: &R,
) -> Result<(), AppError> {
    if can_modify(requester, resource) {
        Ok(())
    } else {
        warn!(
            "user {} denied write access to a resource owned by user {}",
            requester.id,
            resource.owner_id()
        );
        Err(AppError::PermissionDenied)
    }
}
