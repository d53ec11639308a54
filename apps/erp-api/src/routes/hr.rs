//! HR: departments, employees, attendance, and leave.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{NaiveDate, NaiveTime, Utc};
use serde::Deserialize;

use crate::auth::CompanyScope;
use crate::error::{ApiError, ApiResult};
use crate::AppState;
use keel_core::validation::{validate_code, validate_name, validate_non_negative_cents};
use keel_core::{
    Attendance, AttendanceStatus, Department, Employee, EmployeeStatus, EmploymentType, Leave,
    LeaveStatus, LeaveType,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/departments", get(list_departments).post(create_department))
        .route(
            "/departments/:id",
            get(get_department).put(update_department).delete(delete_department),
        )
        .route("/employees", get(list_employees).post(create_employee))
        .route(
            "/employees/:id",
            get(get_employee).put(update_employee).delete(delete_employee),
        )
        .route("/attendances", get(list_attendances).post(create_attendance))
        .route(
            "/attendances/:id",
            get(get_attendance).put(update_attendance).delete(delete_attendance),
        )
        .route("/leaves", get(list_leaves).post(create_leave))
        .route(
            "/leaves/:id",
            get(get_leave).put(update_leave).delete(delete_leave),
        )
}

// =============================================================================
// Payloads
// =============================================================================

#[derive(Debug, Deserialize)]
struct DepartmentPayload {
    name: String,
    description: Option<String>,
    #[serde(default = "default_true")]
    is_active: bool,
}

#[derive(Debug, Deserialize)]
struct EmployeePayload {
    user_id: Option<String>,
    employee_number: String,
    first_name: String,
    last_name: String,
    email: Option<String>,
    phone: Option<String>,
    mobile: Option<String>,
    department_id: Option<String>,
    position: String,
    hire_date: NaiveDate,
    #[serde(default)]
    salary_cents: i64,
    employment_type: EmploymentType,
    status: EmployeeStatus,
    address: Option<String>,
    national_id: Option<String>,
    birth_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
struct AttendancePayload {
    employee_id: String,
    date: NaiveDate,
    check_in: Option<NaiveTime>,
    check_out: Option<NaiveTime>,
    status: AttendanceStatus,
    notes: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LeavePayload {
    employee_id: String,
    leave_type: LeaveType,
    start_date: NaiveDate,
    end_date: NaiveDate,
    days: i64,
    reason: String,
    status: LeaveStatus,
    approved_by: Option<String>,
}

fn default_true() -> bool {
    true
}

// =============================================================================
// Departments
// =============================================================================

async fn list_departments(
    scope: CompanyScope,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<Department>>> {
    Ok(Json(state.db.hr().list_departments(&scope.company_id).await?))
}

async fn create_department(
    scope: CompanyScope,
    State(state): State<AppState>,
    Json(payload): Json<DepartmentPayload>,
) -> ApiResult<(StatusCode, Json<Department>)> {
    validate_name("name", &payload.name)?;

    let now = Utc::now();
    let department = Department {
        id: keel_db::generate_id(),
        company_id: scope.company_id.clone(),
        name: payload.name.trim().to_string(),
        description: payload.description,
        is_active: payload.is_active,
        created_at: now,
        updated_at: now,
    };

    state.db.hr().insert_department(&department).await?;
    Ok((StatusCode::CREATED, Json(department)))
}

async fn get_department(
    scope: CompanyScope,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Department>> {
    let department = state
        .db
        .hr()
        .get_department(&scope.company_id, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Department not found: {id}")))?;

    Ok(Json(department))
}

async fn update_department(
    scope: CompanyScope,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<DepartmentPayload>,
) -> ApiResult<Json<Department>> {
    validate_name("name", &payload.name)?;

    let mut department = state
        .db
        .hr()
        .get_department(&scope.company_id, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Department not found: {id}")))?;

    department.name = payload.name.trim().to_string();
    department.description = payload.description;
    department.is_active = payload.is_active;

    state.db.hr().update_department(&department).await?;
    Ok(Json(department))
}

async fn delete_department(
    scope: CompanyScope,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.db.hr().delete_department(&scope.company_id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Employees
// =============================================================================

async fn list_employees(
    scope: CompanyScope,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<Employee>>> {
    Ok(Json(state.db.hr().list_employees(&scope.company_id).await?))
}

async fn create_employee(
    scope: CompanyScope,
    State(state): State<AppState>,
    Json(payload): Json<EmployeePayload>,
) -> ApiResult<(StatusCode, Json<Employee>)> {
    validate_code("employee_number", &payload.employee_number)?;
    validate_name("first_name", &payload.first_name)?;
    validate_name("last_name", &payload.last_name)?;
    validate_non_negative_cents("salary", payload.salary_cents)?;

    let now = Utc::now();
    let employee = Employee {
        id: keel_db::generate_id(),
        company_id: scope.company_id.clone(),
        user_id: payload.user_id,
        employee_number: payload.employee_number.trim().to_string(),
        first_name: payload.first_name.trim().to_string(),
        last_name: payload.last_name.trim().to_string(),
        email: payload.email,
        phone: payload.phone,
        mobile: payload.mobile,
        department_id: payload.department_id,
        position: payload.position,
        hire_date: payload.hire_date,
        salary_cents: payload.salary_cents,
        employment_type: payload.employment_type,
        status: payload.status,
        address: payload.address,
        national_id: payload.national_id,
        birth_date: payload.birth_date,
        created_at: now,
        updated_at: now,
    };

    state.db.hr().insert_employee(&employee).await?;
    Ok((StatusCode::CREATED, Json(employee)))
}

async fn get_employee(
    scope: CompanyScope,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Employee>> {
    let employee = state
        .db
        .hr()
        .get_employee(&scope.company_id, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Employee not found: {id}")))?;

    Ok(Json(employee))
}

async fn update_employee(
    scope: CompanyScope,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<EmployeePayload>,
) -> ApiResult<Json<Employee>> {
    validate_code("employee_number", &payload.employee_number)?;
    validate_name("first_name", &payload.first_name)?;
    validate_name("last_name", &payload.last_name)?;
    validate_non_negative_cents("salary", payload.salary_cents)?;

    let mut employee = state
        .db
        .hr()
        .get_employee(&scope.company_id, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Employee not found: {id}")))?;

    employee.user_id = payload.user_id;
    employee.employee_number = payload.employee_number.trim().to_string();
    employee.first_name = payload.first_name.trim().to_string();
    employee.last_name = payload.last_name.trim().to_string();
    employee.email = payload.email;
    employee.phone = payload.phone;
    employee.mobile = payload.mobile;
    employee.department_id = payload.department_id;
    employee.position = payload.position;
    employee.hire_date = payload.hire_date;
    employee.salary_cents = payload.salary_cents;
    employee.employment_type = payload.employment_type;
    employee.status = payload.status;
    employee.address = payload.address;
    employee.national_id = payload.national_id;
    employee.birth_date = payload.birth_date;

    state.db.hr().update_employee(&employee).await?;
    Ok(Json(employee))
}

async fn delete_employee(
    scope: CompanyScope,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.db.hr().delete_employee(&scope.company_id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Attendance
// =============================================================================

async fn list_attendances(
    scope: CompanyScope,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<Attendance>>> {
    Ok(Json(state.db.hr().list_attendances(&scope.company_id).await?))
}

async fn create_attendance(
    scope: CompanyScope,
    State(state): State<AppState>,
    Json(payload): Json<AttendancePayload>,
) -> ApiResult<(StatusCode, Json<Attendance>)> {
    let now = Utc::now();
    let attendance = Attendance {
        id: keel_db::generate_id(),
        employee_id: payload.employee_id,
        date: payload.date,
        check_in: payload.check_in,
        check_out: payload.check_out,
        status: payload.status,
        notes: payload.notes,
        created_at: now,
        updated_at: now,
    };

    state
        .db
        .hr()
        .insert_attendance(&scope.company_id, &attendance)
        .await?;
    Ok((StatusCode::CREATED, Json(attendance)))
}

async fn get_attendance(
    scope: CompanyScope,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Attendance>> {
    let attendance = state
        .db
        .hr()
        .get_attendance(&scope.company_id, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Attendance not found: {id}")))?;

    Ok(Json(attendance))
}

async fn update_attendance(
    scope: CompanyScope,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<AttendancePayload>,
) -> ApiResult<Json<Attendance>> {
    let mut attendance = state
        .db
        .hr()
        .get_attendance(&scope.company_id, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Attendance not found: {id}")))?;

    attendance.employee_id = payload.employee_id;
    attendance.date = payload.date;
    attendance.check_in = payload.check_in;
    attendance.check_out = payload.check_out;
    attendance.status = payload.status;
    attendance.notes = payload.notes;

    state
        .db
        .hr()
        .update_attendance(&scope.company_id, &attendance)
        .await?;
    Ok(Json(attendance))
}

async fn delete_attendance(
    scope: CompanyScope,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.db.hr().delete_attendance(&scope.company_id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Leave
// =============================================================================

async fn list_leaves(
    scope: CompanyScope,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<Leave>>> {
    Ok(Json(state.db.hr().list_leaves(&scope.company_id).await?))
}

async fn create_leave(
    scope: CompanyScope,
    State(state): State<AppState>,
    Json(payload): Json<LeavePayload>,
) -> ApiResult<(StatusCode, Json<Leave>)> {
    if payload.days <= 0 {
        return Err(ApiError::Validation("days must be positive".to_string()));
    }
    if payload.end_date < payload.start_date {
        return Err(ApiError::Validation(
            "end_date must not precede start_date".to_string(),
        ));
    }

    let now = Utc::now();
    let leave = Leave {
        id: keel_db::generate_id(),
        employee_id: payload.employee_id,
        leave_type: payload.leave_type,
        start_date: payload.start_date,
        end_date: payload.end_date,
        days: payload.days,
        reason: payload.reason,
        status: payload.status,
        approved_by: payload.approved_by,
        created_at: now,
        updated_at: now,
    };

    state.db.hr().insert_leave(&scope.company_id, &leave).await?;
    Ok((StatusCode::CREATED, Json(leave)))
}

async fn get_leave(
    scope: CompanyScope,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Leave>> {
    let leave = state
        .db
        .hr()
        .get_leave(&scope.company_id, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Leave not found: {id}")))?;

    Ok(Json(leave))
}

async fn update_leave(
    scope: CompanyScope,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<LeavePayload>,
) -> ApiResult<Json<Leave>> {
    let mut leave = state
        .db
        .hr()
        .get_leave(&scope.company_id, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Leave not found: {id}")))?;

    leave.employee_id = payload.employee_id;
    leave.leave_type = payload.leave_type;
    leave.start_date = payload.start_date;
    leave.end_date = payload.end_date;
    leave.days = payload.days;
    leave.reason = payload.reason;
    leave.status = payload.status;
    leave.approved_by = payload.approved_by;

    state.db.hr().update_leave(&scope.company_id, &leave).await?;
    Ok(Json(leave))
}

async fn delete_leave(
    scope: CompanyScope,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.db.hr().delete_leave(&scope.company_id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
