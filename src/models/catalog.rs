//! The static descriptor catalog for every entity the console manages.
//!
//! Top-level entities mirror the administrative entity pages; user-scoped entities are the
//! per-employee tabs reached from a user's detail screen.

use once_cell::sync::Lazy;

use super::{FieldSpec, ResourceDescriptor, Scope, SelectOption};

const REQUEST_STATUSES: [&str; 5] = ["PENDING", "APPROVED", "REJECTED", "CANCELLED", "ARCHIVED"];
const PAYMENT_STATUSES: [&str; 4] = ["PENDING", "PROCESSED", "PAID", "CANCELLED"];
const AUDIT_STATES: [&str; 4] = ["puntual", "tarde", "ausente", "temprano"];
const EXCEPTION_STATES: [&str; 3] = ["pendiente", "aprobado", "rechazado"];
const REQUEST_TYPES: [&str; 5] = [
    "Vacation",
    "Sick Leave",
    "Personal Leave",
    "Maternity",
    "Paternity",
];

fn weekdays() -> Vec<SelectOption> {
    [
        "Sunday",
        "Monday",
        "Tuesday",
        "Wednesday",
        "Thursday",
        "Friday",
        "Saturday",
    ]
    .iter()
    .enumerate()
    .map(|(i, day)| SelectOption::numbered(i as i64, day))
    .collect()
}

static TOP_LEVEL: Lazy<Vec<ResourceDescriptor>> = Lazy::new(|| {
    vec![
        ResourceDescriptor::new("users", "Users", "users")
            .describe("Employee master data")
            .field("name", FieldSpec::text("Full Name").required())
            .field("email", FieldSpec::email("Email").required())
            .field(
                "password",
                FieldSpec::password("Password").required().create_only(),
            )
            .field(
                "role",
                FieldSpec::choice("Role", &["employee", "manager", "admin"]).required(),
            )
            .field("department", FieldSpec::text("Department"))
            .field("position_title", FieldSpec::text("Position"))
            .field("hire_date", FieldSpec::date("Hire Date"))
            .field("salary", FieldSpec::number("Salary").step(0.01))
            .field("is_active", FieldSpec::checkbox("Active")),
        ResourceDescriptor::new("absence-requests", "Absence Requests", "absence-requests")
            .describe("Leave and absence management")
            .field("employee_id", FieldSpec::number("Employee ID").required())
            .field(
                "request_type",
                FieldSpec::choice("Type", &REQUEST_TYPES).required(),
            )
            .field("start_date", FieldSpec::date("Start Date").required())
            .field("end_date", FieldSpec::date("End Date").required())
            .field(
                "total_days",
                FieldSpec::number("Total Days").required().step(0.5),
            )
            .field("reason", FieldSpec::textarea("Reason").required())
            .field("status", FieldSpec::choice("Status", &REQUEST_STATUSES)),
        ResourceDescriptor::new("horarios-base", "Schedules", "horarios-base")
            .describe("Work schedules and shifts")
            .field("empleado_id", FieldSpec::number("Employee ID").required())
            .field("turno_id", FieldSpec::number("Shift ID").required())
            .field(
                "dia_semana",
                FieldSpec::select("Day of Week", weekdays()).required(),
            ),
        ResourceDescriptor::new("turnos", "Shifts", "turnos")
            .describe("Shift definitions")
            .columns(6)
            .field("nombre", FieldSpec::text("Name").required())
            .field("codigo", FieldSpec::text("Code").required())
            .field("hora_inicio", FieldSpec::time("Start Time").required())
            .field("hora_fin", FieldSpec::time("End Time").required())
            .field("es_descanso", FieldSpec::checkbox("Is Rest Day"))
            .field("activo", FieldSpec::checkbox("Active")),
        ResourceDescriptor::new("payroll", "Payroll", "payroll")
            .describe("Payroll history")
            .field("employee_id", FieldSpec::number("Employee ID").required())
            .field("payroll_period", FieldSpec::text("Period").required())
            .field("period_start", FieldSpec::date("Period Start").required())
            .field("period_end", FieldSpec::date("Period End").required())
            .field("base_salary", FieldSpec::number("Base Salary").step(0.01))
            .field("gross_pay", FieldSpec::number("Gross Pay").step(0.01))
            .field(
                "total_deductions",
                FieldSpec::number("Total Deductions").step(0.01),
            )
            .field("net_pay", FieldSpec::number("Net Pay").step(0.01))
            .field("payment_status", FieldSpec::choice("Status", &PAYMENT_STATUSES)),
        ResourceDescriptor::new("auditoria-horarios", "Time Audits", "auditoria-horarios")
            .describe("Time tracking audits")
            .field("empleado_id", FieldSpec::number("Employee ID").required())
            .field("fecha", FieldSpec::date("Date").required())
            .field("hora_entrada", FieldSpec::time("Check In"))
            .field("hora_salida", FieldSpec::time("Check Out"))
            .field("estado", FieldSpec::choice("Status", &AUDIT_STATES))
            .field("notas", FieldSpec::textarea("Notes")),
        ResourceDescriptor::new("benefits", "Benefits", "benefits")
            .describe("Employee benefits")
            .field("employee_id", FieldSpec::number("Employee ID").required())
            .field("benefit_type", FieldSpec::text("Benefit Type").required())
            .field("benefit_name", FieldSpec::text("Benefit Name").required())
            .field("provider", FieldSpec::text("Provider"))
            .field("start_date", FieldSpec::date("Start Date").required())
            .field("end_date", FieldSpec::date("End Date"))
            .field("is_active", FieldSpec::checkbox("Active")),
        ResourceDescriptor::new("notifications", "Notifications", "notifications")
            .describe("User notifications")
            .field("user_id", FieldSpec::number("User ID").required())
            .field("message", FieldSpec::textarea("Message").required())
            .field("notification_type", FieldSpec::text("Type"))
            .field("is_read", FieldSpec::checkbox("Read")),
        ResourceDescriptor::new("emergency-contacts", "Emergency Contacts", "emergency-contacts")
            .describe("Employee emergency contacts")
            .field("employee_id", FieldSpec::number("Employee ID").required())
            .field("contact_name", FieldSpec::text("Contact Name").required())
            .field("relationship", FieldSpec::text("Relationship").required())
            .field("phone_number", FieldSpec::text("Phone").required())
            .field("alternative_phone", FieldSpec::text("Alternative Phone"))
            .field("email", FieldSpec::email("Email"))
            .field("address", FieldSpec::textarea("Address"))
            .field("is_primary", FieldSpec::checkbox("Primary")),
    ]
});

static USER_SCOPED: Lazy<Vec<ResourceDescriptor>> = Lazy::new(|| {
    vec![
        ResourceDescriptor::new("dependents", "Dependents", "dependents")
            .user_scoped()
            .field("employee_id", FieldSpec::number("Employee ID").required())
            .field("dependent_name", FieldSpec::text("Dependent Name").required())
            .field("relationship", FieldSpec::text("Relationship").required())
            .field("birth_date", FieldSpec::date("Birth Date"))
            .field("gender", FieldSpec::text("Gender"))
            .field("curp", FieldSpec::text("CURP"))
            .field("is_beneficiary", FieldSpec::checkbox("Beneficiary"))
            .field(
                "beneficiary_percentage",
                FieldSpec::number("Beneficiary %").step(0.01),
            )
            .field("is_dependent", FieldSpec::checkbox("Dependent"))
            .field("has_disability", FieldSpec::checkbox("Has Disability"))
            .field("notes", FieldSpec::textarea("Notes")),
        ResourceDescriptor::new("documents", "Documents", "documents")
            .user_scoped()
            .field("employee_id", FieldSpec::number("Employee ID").required())
            .field("document_type", FieldSpec::text("Document Type").required())
            .field("document_name", FieldSpec::text("Document Name").required())
            .field("file_path", FieldSpec::text("File Path"))
            .field("file_url", FieldSpec::text("File URL"))
            .field("expiration_date", FieldSpec::date("Expiration Date"))
            .field("is_verified", FieldSpec::checkbox("Verified"))
            .field("verified_by", FieldSpec::number("Verified By"))
            .field("verified_date", FieldSpec::date("Verified Date"))
            .field("notes", FieldSpec::textarea("Notes")),
        ResourceDescriptor::new("job-history", "Job History", "job-history")
            .user_scoped()
            .field("employee_id", FieldSpec::number("Employee ID").required())
            .field("effective_date", FieldSpec::date("Effective Date").required())
            .field("end_date", FieldSpec::date("End Date"))
            .field("position_title", FieldSpec::text("Position"))
            .field("department", FieldSpec::text("Department"))
            .field("area", FieldSpec::text("Area"))
            .field("supervisor_id", FieldSpec::number("Supervisor ID"))
            .field("salary", FieldSpec::number("Salary").step(0.01))
            .field("change_type", FieldSpec::text("Change Type"))
            .field("change_reason", FieldSpec::textarea("Change Reason")),
        ResourceDescriptor::new("time-off-balances", "Time Off Balances", "time-off-balances")
            .user_scoped()
            .field("employee_id", FieldSpec::number("Employee ID").required())
            .field("year", FieldSpec::number("Year").required())
            .field("leave_type", FieldSpec::text("Leave Type").required())
            .field("total_days", FieldSpec::number("Total Days").step(0.5))
            .field("used_days", FieldSpec::number("Used Days").step(0.5))
            .field("pending_days", FieldSpec::number("Pending Days").step(0.5))
            .field("expires_on", FieldSpec::date("Expires On"))
            .field("notes", FieldSpec::textarea("Notes")),
        ResourceDescriptor::new("benefits", "Benefits", "benefits")
            .user_scoped()
            .field("employee_id", FieldSpec::number("Employee ID").required())
            .field("benefit_type", FieldSpec::text("Benefit Type").required())
            .field("benefit_name", FieldSpec::text("Benefit Name").required())
            .field("provider", FieldSpec::text("Provider"))
            .field("policy_number", FieldSpec::text("Policy Number"))
            .field(
                "coverage_amount",
                FieldSpec::number("Coverage Amount").step(0.01),
            )
            .field("start_date", FieldSpec::date("Start Date").required())
            .field("end_date", FieldSpec::date("End Date"))
            .field("employee_cost", FieldSpec::number("Employee Cost").step(0.01))
            .field("employer_cost", FieldSpec::number("Employer Cost").step(0.01))
            .field("beneficiary_name", FieldSpec::text("Beneficiary"))
            .field("is_active", FieldSpec::checkbox("Active"))
            .field("notes", FieldSpec::textarea("Notes")),
        ResourceDescriptor::new("horarios-base", "Base Schedules", "horarios-base")
            .user_scoped()
            .field("empleado_id", FieldSpec::number("Employee ID").required())
            .field("turno_id", FieldSpec::number("Shift ID").required())
            .field(
                "dia_semana",
                FieldSpec::select("Day of Week", weekdays()).required(),
            ),
        ResourceDescriptor::new("horarios-excepcion", "Schedule Exceptions", "horarios-excepcion")
            .user_scoped()
            .field("empleado_id", FieldSpec::number("Employee ID").required())
            .field("fecha_inicio", FieldSpec::date("Start Date").required())
            .field("fecha_fin", FieldSpec::date("End Date").required())
            .field("turno_id", FieldSpec::number("Shift ID").required())
            .field("motivo", FieldSpec::textarea("Reason"))
            .field("aprobado_por", FieldSpec::number("Approved By"))
            .field("estado", FieldSpec::choice("Status", &EXCEPTION_STATES)),
        ResourceDescriptor::new("auditoria-horarios", "Schedule Audit", "auditoria-horarios")
            .user_scoped()
            .field("empleado_id", FieldSpec::number("Employee ID").required())
            .field("fecha", FieldSpec::date("Date").required())
            .field("hora_entrada", FieldSpec::time("Check In"))
            .field("hora_salida", FieldSpec::time("Check Out"))
            .field("estado", FieldSpec::choice("Status", &AUDIT_STATES))
            .field("registrado_por", FieldSpec::number("Recorded By"))
            .field("notas", FieldSpec::textarea("Notes")),
        ResourceDescriptor::new("payroll-history", "Payroll History", "payroll-history")
            .user_scoped()
            .field("employee_id", FieldSpec::number("Employee ID").required())
            .field("payroll_period", FieldSpec::text("Period").required())
            .field("period_start", FieldSpec::date("Period Start").required())
            .field("period_end", FieldSpec::date("Period End").required())
            .field("base_salary", FieldSpec::number("Base Salary").step(0.01))
            .field("overtime_pay", FieldSpec::number("Overtime Pay").step(0.01))
            .field("bonuses", FieldSpec::number("Bonuses").step(0.01))
            .field("gross_pay", FieldSpec::number("Gross Pay").step(0.01))
            .field(
                "total_deductions",
                FieldSpec::number("Total Deductions").step(0.01),
            )
            .field("net_pay", FieldSpec::number("Net Pay").step(0.01))
            .field(
                "payment_status",
                FieldSpec::choice("Payment Status", &PAYMENT_STATUSES),
            )
            .field("payment_date", FieldSpec::date("Payment Date"))
            .field("payment_method", FieldSpec::text("Payment Method")),
        ResourceDescriptor::new("absence-requests", "Absence Requests", "absence-requests")
            .user_scoped()
            .field("employee_id", FieldSpec::number("Employee ID").required())
            .field(
                "request_type",
                FieldSpec::choice("Type", &REQUEST_TYPES).required(),
            )
            .field("start_date", FieldSpec::date("Start Date").required())
            .field("end_date", FieldSpec::date("End Date").required())
            .field(
                "total_days",
                FieldSpec::number("Total Days").required().step(0.5),
            )
            .field("reason", FieldSpec::textarea("Reason").required())
            .field("status", FieldSpec::choice("Status", &REQUEST_STATUSES))
            .field("leave_category", FieldSpec::text("Leave Category"))
            .field("rejection_reason", FieldSpec::textarea("Rejection Reason")),
        ResourceDescriptor::new("approval-history", "Approval History", "approval-history")
            .user_scoped()
            .field("request_id", FieldSpec::number("Request ID").required())
            .field("approver_id", FieldSpec::number("Approver ID").required())
            .field("approval_stage", FieldSpec::text("Stage").required())
            .field("action", FieldSpec::text("Action").required())
            .field("comments", FieldSpec::textarea("Comments")),
        ResourceDescriptor::new("notifications", "Notifications", "notifications")
            .user_scoped()
            .field("user_id", FieldSpec::number("User ID").required())
            .field("request_id", FieldSpec::number("Request ID"))
            .field("message", FieldSpec::textarea("Message").required())
            .field("notification_type", FieldSpec::text("Type"))
            .field("is_read", FieldSpec::checkbox("Read")),
    ]
});

/// All descriptors of the given scope, in menu order.
pub fn descriptors(scope: Scope) -> &'static [ResourceDescriptor] {
    match scope {
        Scope::Top => &TOP_LEVEL,
        Scope::User => &USER_SCOPED,
    }
}

/// Look up a descriptor by entity key within a scope.
pub fn descriptor(scope: Scope, entity_key: &str) -> Option<&'static ResourceDescriptor> {
    descriptors(scope).iter().find(|d| d.entity_key == entity_key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_entity_keys_unique_per_scope() {
        for scope in [Scope::Top, Scope::User] {
            let keys: HashSet<&str> = descriptors(scope)
                .iter()
                .map(|d| d.entity_key.as_str())
                .collect();
            assert_eq!(keys.len(), descriptors(scope).len());
        }
    }

    #[test]
    fn test_scope_flags_match_catalog() {
        assert!(descriptors(Scope::Top).iter().all(|d| d.scope == Scope::Top));
        assert!(descriptors(Scope::User)
            .iter()
            .all(|d| d.scope == Scope::User));
    }

    #[test]
    fn test_select_fields_declare_options() {
        for scope in [Scope::Top, Scope::User] {
            for d in descriptors(scope) {
                for (key, spec) in &d.fields {
                    if spec.kind == crate::models::FieldKind::Select {
                        assert!(!spec.options.is_empty(), "{}.{}", d.entity_key, key);
                    }
                }
            }
        }
    }

    #[test]
    fn test_users_password_is_create_only() {
        let users = descriptor(Scope::Top, "users").unwrap();
        let password = users.get_field("password").unwrap();
        assert!(password.create_only);
        assert!(password.required);
    }

    #[test]
    fn test_lookup_unknown() {
        assert!(descriptor(Scope::Top, "payroll").is_some());
        assert!(descriptor(Scope::Top, "dependents").is_none());
        assert!(descriptor(Scope::User, "dependents").is_some());
    }
}
