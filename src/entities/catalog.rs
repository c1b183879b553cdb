use super::employee::EmployeeHooks;
use super::imam_profile::ImamProfileHooks;
use super::supplier_evaluation::SupplierEvaluationHooks;
use super::ticket::TicketHooks;
use super::{DefaultHooks, EntityDef};
use crate::rbac::Role;

const NO_FILTERS: &[&str] = &[];
const BY_IMAM_PROFILE: &[&str] = &["imam_profile_id"];
const BY_EMPLOYEE: &[&str] = &["employee_id"];
const BY_BOREHOLE: &[&str] = &["borehole_id"];
const BY_SUPPLIER: &[&str] = &["supplier_id"];
const BY_FILE: &[&str] = &["file_id"];

const ANY_ROLE: &[Role] = &[];

macro_rules! entity_def {
    ($name:expr, $route:expr, $table:expr) => {
        entity_def!($name, $route, $table, false, NO_FILTERS, ANY_ROLE, &DefaultHooks)
    };
    ($name:expr, $route:expr, $table:expr, $scoped:expr, $filters:expr) => {
        entity_def!($name, $route, $table, $scoped, $filters, ANY_ROLE, &DefaultHooks)
    };
    ($name:expr, $route:expr, $table:expr, $scoped:expr, $filters:expr, $roles:expr, $hooks:expr) => {
        EntityDef {
            name: $name,
            route: $route,
            table: $table,
            center_scoped: $scoped,
            filter_columns: $filters,
            allowed_roles: $roles,
            hooks: $hooks,
        }
    };
}

/// Every table served by the generic CRUD routes.
pub static CATALOG: &[EntityDef] = &[
    // Beneficiaries and center operations
    entity_def!("Applicant Details", "applicantDetails", "applicant_details", true, NO_FILTERS),
    entity_def!("Home Visit", "homeVisit", "home_visit", true, BY_FILE),
    entity_def!("Financial Assistance", "financialAssistance", "financial_assistance", true, BY_FILE),
    entity_def!("Comments", "comments", "comments", true, BY_FILE),
    entity_def!("Financial Assessment", "financialAssessment", "financial_assessment", false, BY_FILE),
    entity_def!("Programs", "programs", "programs", false, BY_FILE),
    entity_def!("Service Rating", "serviceRating", "service_rating"),
    entity_def!("Center Audits", "centerAudits", "center_audits", true, NO_FILTERS),
    // Suppliers
    entity_def!("Supplier Profile", "supplierProfile", "supplier_profile", true, NO_FILTERS),
    entity_def!("Supplier Document", "supplierDocument", "supplier_document", true, BY_SUPPLIER),
    entity_def!(
        "Supplier Evaluation",
        "supplierEvaluation",
        "supplier_evaluation",
        true,
        BY_SUPPLIER,
        ANY_ROLE,
        &SupplierEvaluationHooks
    ),
    // Staff
    entity_def!("Employee", "employee", "employee", false, NO_FILTERS, ANY_ROLE, &EmployeeHooks),
    entity_def!("Employee Appraisal", "employeeAppraisal", "employee_appraisal", true, BY_EMPLOYEE),
    entity_def!("Employee Initiative", "employeeInitiative", "employee_initiative", true, BY_EMPLOYEE),
    entity_def!("Employee Skills", "employeeSkills", "employee_skills", true, BY_EMPLOYEE),
    entity_def!("Training Institutions", "trainingInstitutions", "training_institutions"),
    entity_def!("Training Courses", "trainingCourses", "training_courses"),
    entity_def!("Policy and Procedure", "policyAndProcedure", "policy_and_procedure", false, NO_FILTERS),
    // Imam management
    entity_def!("Imam Profiles", "imamProfiles", "imam_profiles", false, NO_FILTERS, ANY_ROLE, &ImamProfileHooks),
    entity_def!("Jumuah Khutbah Topic", "jumuahKhutbahTopic", "jumuah_khutbah_topic_submission", false, BY_IMAM_PROFILE),
    entity_def!("Jumuah Audio Khutbah", "jumuahAudioKhutbah", "jumuah_audio_khutbah", false, BY_IMAM_PROFILE),
    entity_def!("Pearls of Wisdom", "pearlsOfWisdom", "pearls_of_wisdom", false, BY_IMAM_PROFILE),
    entity_def!("Medical Reimbursement", "medicalReimbursement", "medical_reimbursement", true, BY_IMAM_PROFILE),
    entity_def!("Community Engagement", "communityEngagement", "community_engagement", false, BY_IMAM_PROFILE),
    entity_def!("Nikah Bonus", "nikahBonus", "nikah_bonus", false, BY_IMAM_PROFILE),
    entity_def!("New Muslim Bonus", "newMuslimBonus", "new_muslim_bonus", false, BY_IMAM_PROFILE),
    entity_def!("New Baby Bonus", "newBabyBonus", "new_baby_bonus", false, BY_IMAM_PROFILE),
    entity_def!("Imam Relationships", "imamRelationships", "imam_relationships", false, BY_IMAM_PROFILE),
    entity_def!("Borehole", "borehole", "borehole", false, BY_IMAM_PROFILE),
    entity_def!("Imam Financial Assistance", "imamFinancialAssistance", "imam_financial_assistance", false, BY_IMAM_PROFILE),
    entity_def!("Educational Development", "educationalDevelopment", "educational_development", false, BY_IMAM_PROFILE),
    entity_def!("Tree Planting", "treePlanting", "tree_planting", false, BY_IMAM_PROFILE),
    entity_def!("Waqf Loan", "waqfLoan", "waqf_loan", false, BY_IMAM_PROFILE),
    entity_def!("Hardship Relief", "hardshipRelief", "hardship_relief", false, BY_IMAM_PROFILE),
    entity_def!("Higher Education Request", "higherEducationRequest", "higher_education_request", false, BY_IMAM_PROFILE),
    entity_def!("Borehole Construction Tasks", "boreholeConstructionTasks", "borehole_construction_tasks", false, BY_BOREHOLE),
    entity_def!("Borehole Repairs Matrix", "boreholeRepairsMatrix", "borehole_repairs_matrix", false, BY_BOREHOLE),
    entity_def!("Tickets", "tickets", "tickets", false, NO_FILTERS, ANY_ROLE, &TicketHooks),
    // Administration
    entity_def!("Email Templates", "emailTemplates", "email_templates", false, NO_FILTERS, &[Role::AppAdmin], &DefaultHooks),
];

/// Look up an entity by its route segment.
pub fn entity(route: &str) -> Option<&'static EntityDef> {
    CATALOG.iter().find(|e| e.route == route)
}
