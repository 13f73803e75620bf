/// Role carried in the bearer token. Approvers decide leave requests,
/// employees only submit them.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Role {
    Admin = 1,
    Approver = 2,
    Employee = 3,
}

impl Role {
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Role::Admin),
            2 => Some(Role::Approver),
            3 => Some(Role::Employee),
            _ => None,
        }
    }

    pub fn can_decide(&self) -> bool {
        matches!(self, Role::Admin | Role::Approver)
    }
}
