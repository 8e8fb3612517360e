//! Role guard.
//!
//! The role is read from the member store on every call and never
//! cached. A role revoked between the check and the write is not
//! detected.

use musubi_core::error::{MusubiError, MusubiResult};
use musubi_core::models::member::CircleRole;
use musubi_core::repository::MemberRepository;
use tracing::warn;
use uuid::Uuid;

/// Require `actor` to hold at least `required` in the circle.
///
/// Organizers satisfy a `Member` requirement. Non-members are always
/// rejected with [`MusubiError::Forbidden`].
pub async fn require_role<M: MemberRepository>(
    members: &M,
    circle_id: Uuid,
    actor: &str,
    required: CircleRole,
) -> MusubiResult<CircleRole> {
    let role = members.find_role(circle_id, actor).await?;
    match (role, required) {
        (Some(CircleRole::Organizer), _) => Ok(CircleRole::Organizer),
        (Some(CircleRole::Member), CircleRole::Member) => Ok(CircleRole::Member),
        (Some(CircleRole::Member), CircleRole::Organizer) => {
            warn!(%circle_id, actor, "Organizer role required");
            Err(MusubiError::forbidden("organizer role required"))
        }
        (None, _) => {
            warn!(%circle_id, actor, "Caller is not a member of the circle");
            Err(MusubiError::forbidden("not a member of this circle"))
        }
    }
}

pub async fn require_organizer<M: MemberRepository>(
    members: &M,
    circle_id: Uuid,
    actor: &str,
) -> MusubiResult<()> {
    require_role(members, circle_id, actor, CircleRole::Organizer).await?;
    Ok(())
}
