//! # HR Repository
//!
//! Departments, employees, attendance, and leave. Attendance and leave are
//! scoped through their employee's company with a join.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use keel_core::{Attendance, Department, Employee, Leave};

const DEPARTMENT_COLUMNS: &str =
    "id, company_id, name, description, is_active, created_at, updated_at";

const EMPLOYEE_COLUMNS: &str = "id, company_id, user_id, employee_number, first_name, \
     last_name, email, phone, mobile, department_id, position, hire_date, salary_cents, \
     employment_type, status, address, national_id, birth_date, created_at, updated_at";

const ATTENDANCE_COLUMNS: &str =
    "id, employee_id, date, check_in, check_out, status, notes, created_at, updated_at";

const LEAVE_COLUMNS: &str = "id, employee_id, leave_type, start_date, end_date, days, \
     reason, status, approved_by, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct HrRepository {
    pool: SqlitePool,
}

impl HrRepository {
    pub fn new(pool: SqlitePool) -> Self {
        HrRepository { pool }
    }

    // -------------------------------------------------------------------------
    // Departments
    // -------------------------------------------------------------------------

    pub async fn list_departments(&self, company_id: &str) -> DbResult<Vec<Department>> {
        let rows = sqlx::query_as::<_, Department>(&format!(
            "SELECT {DEPARTMENT_COLUMNS} FROM departments WHERE company_id = ?1 ORDER BY name"
        ))
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn get_department(
        &self,
        company_id: &str,
        id: &str,
    ) -> DbResult<Option<Department>> {
        let row = sqlx::query_as::<_, Department>(&format!(
            "SELECT {DEPARTMENT_COLUMNS} FROM departments WHERE id = ?1 AND company_id = ?2"
        ))
        .bind(id)
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn insert_department(&self, department: &Department) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO departments (id, company_id, name, description, is_active, \
             created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(&department.id)
        .bind(&department.company_id)
        .bind(&department.name)
        .bind(&department.description)
        .bind(department.is_active)
        .bind(department.created_at)
        .bind(department.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn update_department(&self, department: &Department) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE departments SET name = ?3, description = ?4, is_active = ?5, \
             updated_at = ?6 WHERE id = ?1 AND company_id = ?2",
        )
        .bind(&department.id)
        .bind(&department.company_id)
        .bind(&department.name)
        .bind(&department.description)
        .bind(department.is_active)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Department", &department.id));
        }

        Ok(())
    }

    pub async fn delete_department(&self, company_id: &str, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM departments WHERE id = ?1 AND company_id = ?2")
            .bind(id)
            .bind(company_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Department", id));
        }

        Ok(())
    }

    // -------------------------------------------------------------------------
    // Employees
    // -------------------------------------------------------------------------

    pub async fn list_employees(&self, company_id: &str) -> DbResult<Vec<Employee>> {
        let rows = sqlx::query_as::<_, Employee>(&format!(
            "SELECT {EMPLOYEE_COLUMNS} FROM employees \
             WHERE company_id = ?1 ORDER BY last_name, first_name"
        ))
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn get_employee(&self, company_id: &str, id: &str) -> DbResult<Option<Employee>> {
        let row = sqlx::query_as::<_, Employee>(&format!(
            "SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = ?1 AND company_id = ?2"
        ))
        .bind(id)
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn insert_employee(&self, employee: &Employee) -> DbResult<()> {
        debug!(employee_number = %employee.employee_number, "Inserting employee");

        sqlx::query(
            "INSERT INTO employees (id, company_id, user_id, employee_number, first_name, \
             last_name, email, phone, mobile, department_id, position, hire_date, \
             salary_cents, employment_type, status, address, national_id, birth_date, \
             created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, \
             ?17, ?18, ?19, ?20)",
        )
        .bind(&employee.id)
        .bind(&employee.company_id)
        .bind(&employee.user_id)
        .bind(&employee.employee_number)
        .bind(&employee.first_name)
        .bind(&employee.last_name)
        .bind(&employee.email)
        .bind(&employee.phone)
        .bind(&employee.mobile)
        .bind(&employee.department_id)
        .bind(&employee.position)
        .bind(employee.hire_date)
        .bind(employee.salary_cents)
        .bind(employee.employment_type)
        .bind(employee.status)
        .bind(&employee.address)
        .bind(&employee.national_id)
        .bind(employee.birth_date)
        .bind(employee.created_at)
        .bind(employee.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn update_employee(&self, employee: &Employee) -> DbResult<()> {
        debug!(id = %employee.id, "Updating employee");

        let result = sqlx::query(
            "UPDATE employees SET user_id = ?3, employee_number = ?4, first_name = ?5, \
             last_name = ?6, email = ?7, phone = ?8, mobile = ?9, department_id = ?10, \
             position = ?11, hire_date = ?12, salary_cents = ?13, employment_type = ?14, \
             status = ?15, address = ?16, national_id = ?17, birth_date = ?18, \
             updated_at = ?19 WHERE id = ?1 AND company_id = ?2",
        )
        .bind(&employee.id)
        .bind(&employee.company_id)
        .bind(&employee.user_id)
        .bind(&employee.employee_number)
        .bind(&employee.first_name)
        .bind(&employee.last_name)
        .bind(&employee.email)
        .bind(&employee.phone)
        .bind(&employee.mobile)
        .bind(&employee.department_id)
        .bind(&employee.position)
        .bind(employee.hire_date)
        .bind(employee.salary_cents)
        .bind(employee.employment_type)
        .bind(employee.status)
        .bind(&employee.address)
        .bind(&employee.national_id)
        .bind(employee.birth_date)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Employee", &employee.id));
        }

        Ok(())
    }

    pub async fn delete_employee(&self, company_id: &str, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM employees WHERE id = ?1 AND company_id = ?2")
            .bind(id)
            .bind(company_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Employee", id));
        }

        Ok(())
    }

    // -------------------------------------------------------------------------
    // Attendance
    // -------------------------------------------------------------------------

    pub async fn list_attendances(&self, company_id: &str) -> DbResult<Vec<Attendance>> {
        let rows = sqlx::query_as::<_, Attendance>(
            "SELECT a.id, a.employee_id, a.date, a.check_in, a.check_out, a.status, a.notes, \
             a.created_at, a.updated_at \
             FROM attendances a INNER JOIN employees e ON e.id = a.employee_id \
             WHERE e.company_id = ?1 ORDER BY a.date DESC",
        )
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn get_attendance(
        &self,
        company_id: &str,
        id: &str,
    ) -> DbResult<Option<Attendance>> {
        let row = sqlx::query_as::<_, Attendance>(
            "SELECT a.id, a.employee_id, a.date, a.check_in, a.check_out, a.status, a.notes, \
             a.created_at, a.updated_at \
             FROM attendances a INNER JOIN employees e ON e.id = a.employee_id \
             WHERE a.id = ?1 AND e.company_id = ?2",
        )
        .bind(id)
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Insert guarded by the employee's company; the (employee, date) unique
    /// index keeps one record per day.
    pub async fn insert_attendance(&self, company_id: &str, attendance: &Attendance) -> DbResult<()> {
        self.assert_employee(company_id, &attendance.employee_id).await?;

        sqlx::query(&format!(
            "INSERT INTO attendances ({ATTENDANCE_COLUMNS}) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"
        ))
        .bind(&attendance.id)
        .bind(&attendance.employee_id)
        .bind(attendance.date)
        .bind(attendance.check_in)
        .bind(attendance.check_out)
        .bind(attendance.status)
        .bind(&attendance.notes)
        .bind(attendance.created_at)
        .bind(attendance.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn update_attendance(&self, company_id: &str, attendance: &Attendance) -> DbResult<()> {
        self.assert_employee(company_id, &attendance.employee_id).await?;

        let result = sqlx::query(
            "UPDATE attendances SET employee_id = ?2, date = ?3, check_in = ?4, \
             check_out = ?5, status = ?6, notes = ?7, updated_at = ?8 WHERE id = ?1",
        )
        .bind(&attendance.id)
        .bind(&attendance.employee_id)
        .bind(attendance.date)
        .bind(attendance.check_in)
        .bind(attendance.check_out)
        .bind(attendance.status)
        .bind(&attendance.notes)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Attendance", &attendance.id));
        }

        Ok(())
    }

    pub async fn delete_attendance(&self, company_id: &str, id: &str) -> DbResult<()> {
        let result = sqlx::query(
            "DELETE FROM attendances WHERE id = ?1 AND employee_id IN \
             (SELECT id FROM employees WHERE company_id = ?2)",
        )
        .bind(id)
        .bind(company_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Attendance", id));
        }

        Ok(())
    }

    // -------------------------------------------------------------------------
    // Leave
    // -------------------------------------------------------------------------

    pub async fn list_leaves(&self, company_id: &str) -> DbResult<Vec<Leave>> {
        let rows = sqlx::query_as::<_, Leave>(
            "SELECT l.id, l.employee_id, l.leave_type, l.start_date, l.end_date, l.days, \
             l.reason, l.status, l.approved_by, l.created_at, l.updated_at \
             FROM leaves l INNER JOIN employees e ON e.id = l.employee_id \
             WHERE e.company_id = ?1 ORDER BY l.start_date DESC",
        )
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn get_leave(&self, company_id: &str, id: &str) -> DbResult<Option<Leave>> {
        let row = sqlx::query_as::<_, Leave>(
            "SELECT l.id, l.employee_id, l.leave_type, l.start_date, l.end_date, l.days, \
             l.reason, l.status, l.approved_by, l.created_at, l.updated_at \
             FROM leaves l INNER JOIN employees e ON e.id = l.employee_id \
             WHERE l.id = ?1 AND e.company_id = ?2",
        )
        .bind(id)
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn insert_leave(&self, company_id: &str, leave: &Leave) -> DbResult<()> {
        self.assert_employee(company_id, &leave.employee_id).await?;

        sqlx::query(&format!(
            "INSERT INTO leaves ({LEAVE_COLUMNS}) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"
        ))
        .bind(&leave.id)
        .bind(&leave.employee_id)
        .bind(leave.leave_type)
        .bind(leave.start_date)
        .bind(leave.end_date)
        .bind(leave.days)
        .bind(&leave.reason)
        .bind(leave.status)
        .bind(&leave.approved_by)
        .bind(leave.created_at)
        .bind(leave.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn update_leave(&self, company_id: &str, leave: &Leave) -> DbResult<()> {
        self.assert_employee(company_id, &leave.employee_id).await?;

        let result = sqlx::query(
            "UPDATE leaves SET employee_id = ?2, leave_type = ?3, start_date = ?4, \
             end_date = ?5, days = ?6, reason = ?7, status = ?8, approved_by = ?9, \
             updated_at = ?10 WHERE id = ?1",
        )
        .bind(&leave.id)
        .bind(&leave.employee_id)
        .bind(leave.leave_type)
        .bind(leave.start_date)
        .bind(leave.end_date)
        .bind(leave.days)
        .bind(&leave.reason)
        .bind(leave.status)
        .bind(&leave.approved_by)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Leave", &leave.id));
        }

        Ok(())
    }

    pub async fn delete_leave(&self, company_id: &str, id: &str) -> DbResult<()> {
        let result = sqlx::query(
            "DELETE FROM leaves WHERE id = ?1 AND employee_id IN \
             (SELECT id FROM employees WHERE company_id = ?2)",
        )
        .bind(id)
        .bind(company_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Leave", id));
        }

        Ok(())
    }

    /// The employee a child record points at must live in the caller's
    /// company.
    async fn assert_employee(&self, company_id: &str, employee_id: &str) -> DbResult<()> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM employees WHERE id = ?1 AND company_id = ?2")
                .bind(employee_id)
                .bind(company_id)
                .fetch_one(&self.pool)
                .await?;

        if count == 0 {
            return Err(DbError::not_found("Employee", employee_id));
        }

        Ok(())
    }
}
