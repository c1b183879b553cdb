//! Role-based access control: the role matrix and route-to-module mapping.

pub mod matrix;
pub mod role;

pub use matrix::{
    allowed_methods, can_access_route, can_mutate_policy, can_perform_method, is_module_allowed,
    is_read_only_method, module_for_route, needs_center_restriction, report_scope, role_rule, AppModule,
    ReportScope, RoleRule,
};
pub use role::{parse_int_like, parse_role_id, Role, RoleRef};
