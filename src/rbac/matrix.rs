use serde::Serialize;

use super::role::Role;

pub const READ_ONLY: &[&str] = &["GET", "HEAD", "OPTIONS"];
pub const FULL: &[&str] = &["GET", "POST", "PUT", "PATCH", "DELETE"];

/// Functional areas of the API, resolved from the request path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AppModule {
    #[serde(rename = "default")]
    Default,
    #[serde(rename = "auth")]
    Auth,
    #[serde(rename = "dashboard")]
    Dashboard,
    #[serde(rename = "programs")]
    Programs,
    #[serde(rename = "financialAssessment")]
    FinancialAssessment,
    #[serde(rename = "employee")]
    Employee,
    #[serde(rename = "training")]
    Training,
    #[serde(rename = "hseq")]
    Hseq,
    #[serde(rename = "policy")]
    Policy,
    #[serde(rename = "lookup")]
    Lookup,
    #[serde(rename = "reports")]
    Reports,
    #[serde(rename = "fileManager")]
    FileManager,
    #[serde(rename = "chat")]
    Chat,
    #[serde(rename = "personalFiles")]
    PersonalFiles,
    #[serde(rename = "imamProfiles")]
    ImamProfiles,
}

impl AppModule {
    pub fn key(self) -> &'static str {
        match self {
            AppModule::Default => "default",
            AppModule::Auth => "auth",
            AppModule::Dashboard => "dashboard",
            AppModule::Programs => "programs",
            AppModule::FinancialAssessment => "financialAssessment",
            AppModule::Employee => "employee",
            AppModule::Training => "training",
            AppModule::Hseq => "hseq",
            AppModule::Policy => "policy",
            AppModule::Lookup => "lookup",
            AppModule::Reports => "reports",
            AppModule::FileManager => "fileManager",
            AppModule::Chat => "chat",
            AppModule::PersonalFiles => "personalFiles",
            AppModule::ImamProfiles => "imamProfiles",
        }
    }
}

impl std::fmt::Display for AppModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportScope {
    All,
    Own,
}

#[derive(Debug)]
pub enum ModuleAccess {
    All,
    Only(&'static [AppModule]),
}

#[derive(Debug)]
pub struct RoleRule {
    pub role: Role,
    pub center_scoped: bool,
    pub report_scope: ReportScope,
    pub allow: ModuleAccess,
    pub deny: &'static [AppModule],
    pub default_methods: &'static [&'static str],
    pub method_overrides: &'static [(AppModule, &'static [&'static str])],
}

impl RoleRule {
    pub fn allows_module(&self, module: AppModule) -> bool {
        if self.deny.contains(&module) {
            return false;
        }
        match self.allow {
            ModuleAccess::All => true,
            ModuleAccess::Only(list) => list.contains(&module),
        }
    }

    pub fn methods_for(&self, module: AppModule) -> &'static [&'static str] {
        self.method_overrides
            .iter()
            .find(|(m, _)| *m == module)
            .map(|(_, methods)| *methods)
            .unwrap_or(self.default_methods)
    }
}

/// Ordered prefix table; the first entry with a matching prefix wins.
pub static MODULE_ROUTE_MAP: &[(AppModule, &[&str])] = &[
    (AppModule::Auth, &["/api/auth"]),
    (AppModule::Dashboard, &["/api/dashboard"]),
    (AppModule::Programs, &["/api/programs"]),
    (
        AppModule::Employee,
        &["/api/employee", "/api/employeeappraisal", "/api/employeeinitiative", "/api/employeeskills"],
    ),
    (AppModule::Training, &["/api/traininginstitutions", "/api/trainingcourses"]),
    (AppModule::Policy, &["/api/policyandprocedure"]),
    (AppModule::Lookup, &["/api/lookup"]),
    (AppModule::Reports, &["/api/reports"]),
    (AppModule::FileManager, &["/api/folders", "/api/personalfiles"]),
    (AppModule::PersonalFiles, &["/api/personalfiles"]),
    (AppModule::Chat, &["/api/messages", "/api/conversations", "/api/conversationparticipants"]),
    (
        AppModule::ImamProfiles,
        &[
            "/api/imamprofiles",
            "/api/pearlsofwisdom",
            "/api/jumuahkhutbahtopic",
            "/api/medicalreimbursement",
            "/api/communityengagement",
            "/api/nikahbonus",
            "/api/jumuahaudiokhutbah",
            "/api/newmuslimbonus",
            "/api/newbabybonus",
            "/api/imamrelationships",
            "/api/borehole",
            "/api/imamfinancialassistance",
            "/api/educationaldevelopment",
            "/api/treeplanting",
            "/api/waqfloan",
            "/api/hardshiprelief",
            "/api/highereducationrequest",
            "/api/boreholeconstructiontasks",
            "/api/boreholerepairsmatrix",
            "/api/tickets",
        ],
    ),
];

pub static ROLE_RULES: [RoleRule; 6] = [
    RoleRule {
        role: Role::AppAdmin,
        center_scoped: false,
        report_scope: ReportScope::All,
        allow: ModuleAccess::All,
        deny: &[],
        default_methods: FULL,
        method_overrides: &[],
    },
    RoleRule {
        role: Role::HQ,
        center_scoped: false,
        report_scope: ReportScope::All,
        allow: ModuleAccess::All,
        deny: &[],
        default_methods: FULL,
        method_overrides: &[],
    },
    RoleRule {
        role: Role::OrgAdmin,
        center_scoped: true,
        report_scope: ReportScope::Own,
        allow: ModuleAccess::All,
        deny: &[],
        default_methods: FULL,
        method_overrides: &[(AppModule::Policy, READ_ONLY)],
    },
    RoleRule {
        role: Role::OrgExecutive,
        center_scoped: true,
        report_scope: ReportScope::Own,
        allow: ModuleAccess::All,
        deny: &[AppModule::FileManager, AppModule::PersonalFiles, AppModule::Chat],
        default_methods: READ_ONLY,
        method_overrides: &[(AppModule::Auth, FULL)],
    },
    RoleRule {
        role: Role::OrgCaseworker,
        center_scoped: true,
        report_scope: ReportScope::Own,
        allow: ModuleAccess::Only(&[
            AppModule::Dashboard,
            AppModule::Programs,
            AppModule::FileManager,
            AppModule::Chat,
            AppModule::Policy,
            AppModule::Reports,
            AppModule::PersonalFiles,
            AppModule::Training,
            AppModule::Employee,
            AppModule::Lookup,
            AppModule::Auth,
        ]),
        deny: &[],
        default_methods: FULL,
        method_overrides: &[
            (AppModule::Policy, READ_ONLY),
            (AppModule::Reports, READ_ONLY),
            (AppModule::Lookup, READ_ONLY),
            (AppModule::Training, READ_ONLY),
            (AppModule::Employee, READ_ONLY),
        ],
    },
    RoleRule {
        role: Role::ImamUser,
        center_scoped: false,
        report_scope: ReportScope::Own,
        allow: ModuleAccess::Only(&[
            AppModule::Dashboard,
            AppModule::ImamProfiles,
            AppModule::Auth,
            AppModule::Employee,
            AppModule::Chat,
        ]),
        deny: &[
            AppModule::Programs,
            AppModule::FileManager,
            AppModule::Policy,
            AppModule::Reports,
            AppModule::PersonalFiles,
            AppModule::Training,
            AppModule::Lookup,
        ],
        default_methods: FULL,
        method_overrides: &[(AppModule::ImamProfiles, FULL), (AppModule::Employee, READ_ONLY)],
    },
];

pub fn role_rule(role: Role) -> &'static RoleRule {
    // ROLE_RULES holds exactly one rule per role, in id order
    &ROLE_RULES[(role.id() - 1) as usize]
}

pub fn module_for_route(path: &str) -> AppModule {
    let normalized = path.to_lowercase();
    MODULE_ROUTE_MAP
        .iter()
        .find(|(_, prefixes)| prefixes.iter().any(|p| normalized.starts_with(p)))
        .map(|(module, _)| *module)
        .unwrap_or(AppModule::Default)
}

pub fn is_module_allowed(role: Option<Role>, module: AppModule) -> bool {
    role.map(|r| role_rule(r).allows_module(module)).unwrap_or(false)
}

pub fn allowed_methods(role: Option<Role>, module: AppModule) -> &'static [&'static str] {
    role.map(|r| role_rule(r).methods_for(module)).unwrap_or(&[])
}

pub fn can_access_route(role: Option<Role>, path: &str) -> bool {
    let module = module_for_route(path);
    // Lookups are readable by everyone
    if module == AppModule::Lookup {
        return true;
    }
    is_module_allowed(role, module)
}

pub fn can_perform_method(role: Option<Role>, method: &str, module: AppModule) -> bool {
    let method = method.to_ascii_uppercase();
    allowed_methods(role, module).iter().any(|m| *m == method)
}

pub fn needs_center_restriction(role: Option<Role>) -> bool {
    role.map(|r| role_rule(r).center_scoped).unwrap_or(true)
}

pub fn report_scope(role: Option<Role>) -> ReportScope {
    role.map(|r| role_rule(r).report_scope).unwrap_or(ReportScope::Own)
}

pub fn can_mutate_policy(role: Option<Role>) -> bool {
    matches!(role, Some(Role::AppAdmin) | Some(Role::HQ))
}

pub fn is_read_only_method(method: &str) -> bool {
    READ_ONLY.contains(&method.to_ascii_uppercase().as_str())
}
