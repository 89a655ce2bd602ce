use crate::auth::repo::{Role, User};
use crate::error::ApiError;

/// Operations a request may target, as seen by the authorization layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    PaketRead,
    PaketWrite,
    PelangganRead,
    PelangganWrite,
    TagihanList,
    TagihanSummary,
    TagihanDetail,
    TagihanWrite,
}

/// Visibility granted to an admitted request. `Pelanggan` narrows every
/// query to one customer's rows; repos inject it into the SQL predicate
/// before execution so counts and totals never leak.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    All,
    Pelanggan(i64),
}

/// Pure admission decision for an authenticated user. Invalid and expired
/// tokens are rejected earlier (401) by the extractors; everything here is a
/// role question (403).
///
/// USER accounts may only list invoices and read the yearly summary, always
/// narrowed to their linked customer. Invoice detail and every mutation stay
/// admin-only, including a USER's own rows.
pub fn authorize(user: &User, op: Operation) -> Result<Scope, ApiError> {
    match user.role {
        Role::Admin => Ok(Scope::All),
        Role::User => match op {
            Operation::TagihanList | Operation::TagihanSummary => user
                .pelanggan_id
                .map(Scope::Pelanggan)
                .ok_or(ApiError::InsufficientRole),
            _ => Err(ApiError::InsufficientRole),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    fn user_with(role: Role, pelanggan_id: Option<i64>) -> User {
        User {
            id: 1,
            username: "tester".into(),
            email: "tester@example.com".into(),
            password_hash: "x".into(),
            role,
            pelanggan_id,
            is_active: true,
            created_at: OffsetDateTime::now_utc(),
            updated_at: OffsetDateTime::now_utc(),
        }
    }

    const ALL_OPERATIONS: [Operation; 8] = [
        Operation::PaketRead,
        Operation::PaketWrite,
        Operation::PelangganRead,
        Operation::PelangganWrite,
        Operation::TagihanList,
        Operation::TagihanSummary,
        Operation::TagihanDetail,
        Operation::TagihanWrite,
    ];

    #[test]
    fn admin_gets_full_scope_everywhere() {
        let admin = user_with(Role::Admin, None);
        for op in ALL_OPERATIONS {
            assert!(matches!(authorize(&admin, op), Ok(Scope::All)), "{op:?}");
        }
    }

    #[test]
    fn user_is_narrowed_to_linked_customer_for_invoice_reads() {
        let user = user_with(Role::User, Some(7));
        assert!(matches!(
            authorize(&user, Operation::TagihanList),
            Ok(Scope::Pelanggan(7))
        ));
        assert!(matches!(
            authorize(&user, Operation::TagihanSummary),
            Ok(Scope::Pelanggan(7))
        ));
    }

    #[test]
    fn user_is_denied_everything_else() {
        let user = user_with(Role::User, Some(7));
        for op in [
            Operation::PaketRead,
            Operation::PaketWrite,
            Operation::PelangganRead,
            Operation::PelangganWrite,
            Operation::TagihanDetail,
            Operation::TagihanWrite,
        ] {
            assert!(
                matches!(authorize(&user, op), Err(ApiError::InsufficientRole)),
                "{op:?} should be denied"
            );
        }
    }

    #[test]
    fn user_without_linked_customer_is_denied_invoice_reads() {
        let user = user_with(Role::User, None);
        assert!(matches!(
            authorize(&user, Operation::TagihanList),
            Err(ApiError::InsufficientRole)
        ));
        assert!(matches!(
            authorize(&user, Operation::TagihanSummary),
            Err(ApiError::InsufficientRole)
        ));
    }
}
