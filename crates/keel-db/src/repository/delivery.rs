//! # Delivery Repository
//!
//! Drivers, deliveries, and routes, plus the dispatch workflow: driver
//! assignment, status updates, and route execution.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use keel_core::{
    Delivery, DeliveryItem, DeliveryRoute, DeliveryStatus, Driver, RouteDelivery, RouteStatus,
};

const DRIVER_COLUMNS: &str = "id, company_id, name, phone, email, vehicle_type, \
     vehicle_plate, license_number, status, is_active, notes, created_at, updated_at";

const DELIVERY_COLUMNS: &str = "id, company_id, delivery_number, sales_order_id, customer_id, \
     driver_id, pickup_address, delivery_address, customer_phone, scheduled_date, \
     scheduled_time, pickup_date, delivery_date, status, priority, distance_km, \
     delivery_fee_cents, tracking_code, signature, notes, internal_notes, created_by, \
     created_at, updated_at";

const ROUTE_COLUMNS: &str = "id, company_id, route_name, driver_id, date, status, \
     start_location, end_location, total_distance_km, estimated_duration, start_time, \
     end_time, notes, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct DeliveryRepository {
    pool: SqlitePool,
}

impl DeliveryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        DeliveryRepository { pool }
    }

    // -------------------------------------------------------------------------
    // Drivers
    // -------------------------------------------------------------------------

    pub async fn list_drivers(&self, company_id: &str) -> DbResult<Vec<Driver>> {
        let rows = sqlx::query_as::<_, Driver>(&format!(
            "SELECT {DRIVER_COLUMNS} FROM drivers WHERE company_id = ?1 ORDER BY name"
        ))
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Active drivers currently marked available, for the dispatch screen.
    pub async fn list_available_drivers(&self, company_id: &str) -> DbResult<Vec<Driver>> {
        let rows = sqlx::query_as::<_, Driver>(&format!(
            "SELECT {DRIVER_COLUMNS} FROM drivers \
             WHERE company_id = ?1 AND status = 'available' AND is_active = 1 ORDER BY name"
        ))
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn get_driver(&self, company_id: &str, id: &str) -> DbResult<Option<Driver>> {
        let row = sqlx::query_as::<_, Driver>(&format!(
            "SELECT {DRIVER_COLUMNS} FROM drivers WHERE id = ?1 AND company_id = ?2"
        ))
        .bind(id)
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn insert_driver(&self, driver: &Driver) -> DbResult<()> {
        debug!(name = %driver.name, "Inserting driver");

        sqlx::query(&format!(
            "INSERT INTO drivers ({DRIVER_COLUMNS}) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)"
        ))
        .bind(&driver.id)
        .bind(&driver.company_id)
        .bind(&driver.name)
        .bind(&driver.phone)
        .bind(&driver.email)
        .bind(&driver.vehicle_type)
        .bind(&driver.vehicle_plate)
        .bind(&driver.license_number)
        .bind(driver.status)
        .bind(driver.is_active)
        .bind(&driver.notes)
        .bind(driver.created_at)
        .bind(driver.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn update_driver(&self, driver: &Driver) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE drivers SET name = ?3, phone = ?4, email = ?5, vehicle_type = ?6, \
             vehicle_plate = ?7, license_number = ?8, status = ?9, is_active = ?10, \
             notes = ?11, updated_at = ?12 WHERE id = ?1 AND company_id = ?2",
        )
        .bind(&driver.id)
        .bind(&driver.company_id)
        .bind(&driver.name)
        .bind(&driver.phone)
        .bind(&driver.email)
        .bind(&driver.vehicle_type)
        .bind(&driver.vehicle_plate)
        .bind(&driver.license_number)
        .bind(driver.status)
        .bind(driver.is_active)
        .bind(&driver.notes)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Driver", &driver.id));
        }

        Ok(())
    }

    pub async fn delete_driver(&self, company_id: &str, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM drivers WHERE id = ?1 AND company_id = ?2")
            .bind(id)
            .bind(company_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Driver", id));
        }

        Ok(())
    }

    // -------------------------------------------------------------------------
    // Deliveries
    // -------------------------------------------------------------------------

    pub async fn list_deliveries(&self, company_id: &str) -> DbResult<Vec<Delivery>> {
        let rows = sqlx::query_as::<_, Delivery>(&format!(
            "SELECT {DELIVERY_COLUMNS} FROM deliveries \
             WHERE company_id = ?1 ORDER BY scheduled_date DESC, priority DESC"
        ))
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Deliveries waiting for a driver.
    pub async fn list_pending(&self, company_id: &str) -> DbResult<Vec<Delivery>> {
        let rows = sqlx::query_as::<_, Delivery>(&format!(
            "SELECT {DELIVERY_COLUMNS} FROM deliveries \
             WHERE company_id = ?1 AND status = 'pending' \
             ORDER BY scheduled_date DESC, priority DESC"
        ))
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Deliveries on the road (picked up or in transit).
    pub async fn list_in_transit(&self, company_id: &str) -> DbResult<Vec<Delivery>> {
        let rows = sqlx::query_as::<_, Delivery>(&format!(
            "SELECT {DELIVERY_COLUMNS} FROM deliveries \
             WHERE company_id = ?1 AND status IN ('picked_up', 'in_transit') \
             ORDER BY scheduled_date DESC, priority DESC"
        ))
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn get_delivery(&self, company_id: &str, id: &str) -> DbResult<Option<Delivery>> {
        let row = sqlx::query_as::<_, Delivery>(&format!(
            "SELECT {DELIVERY_COLUMNS} FROM deliveries WHERE id = ?1 AND company_id = ?2"
        ))
        .bind(id)
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn insert_delivery(&self, delivery: &Delivery) -> DbResult<()> {
        debug!(delivery_number = %delivery.delivery_number, "Inserting delivery");

        sqlx::query(&format!(
            "INSERT INTO deliveries ({DELIVERY_COLUMNS}) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, \
             ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24)"
        ))
        .bind(&delivery.id)
        .bind(&delivery.company_id)
        .bind(&delivery.delivery_number)
        .bind(&delivery.sales_order_id)
        .bind(&delivery.customer_id)
        .bind(&delivery.driver_id)
        .bind(&delivery.pickup_address)
        .bind(&delivery.delivery_address)
        .bind(&delivery.customer_phone)
        .bind(delivery.scheduled_date)
        .bind(delivery.scheduled_time)
        .bind(delivery.pickup_date)
        .bind(delivery.delivery_date)
        .bind(delivery.status)
        .bind(delivery.priority)
        .bind(delivery.distance_km)
        .bind(delivery.delivery_fee_cents)
        .bind(&delivery.tracking_code)
        .bind(&delivery.signature)
        .bind(&delivery.notes)
        .bind(&delivery.internal_notes)
        .bind(&delivery.created_by)
        .bind(delivery.created_at)
        .bind(delivery.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn update_delivery(&self, delivery: &Delivery) -> DbResult<()> {
        debug!(id = %delivery.id, "Updating delivery");

        let result = sqlx::query(
            "UPDATE deliveries SET delivery_number = ?3, sales_order_id = ?4, \
             customer_id = ?5, driver_id = ?6, pickup_address = ?7, delivery_address = ?8, \
             customer_phone = ?9, scheduled_date = ?10, scheduled_time = ?11, \
             pickup_date = ?12, delivery_date = ?13, status = ?14, priority = ?15, \
             distance_km = ?16, delivery_fee_cents = ?17, tracking_code = ?18, \
             signature = ?19, notes = ?20, internal_notes = ?21, updated_at = ?22 \
             WHERE id = ?1 AND company_id = ?2",
        )
        .bind(&delivery.id)
        .bind(&delivery.company_id)
        .bind(&delivery.delivery_number)
        .bind(&delivery.sales_order_id)
        .bind(&delivery.customer_id)
        .bind(&delivery.driver_id)
        .bind(&delivery.pickup_address)
        .bind(&delivery.delivery_address)
        .bind(&delivery.customer_phone)
        .bind(delivery.scheduled_date)
        .bind(delivery.scheduled_time)
        .bind(delivery.pickup_date)
        .bind(delivery.delivery_date)
        .bind(delivery.status)
        .bind(delivery.priority)
        .bind(delivery.distance_km)
        .bind(delivery.delivery_fee_cents)
        .bind(&delivery.tracking_code)
        .bind(&delivery.signature)
        .bind(&delivery.notes)
        .bind(&delivery.internal_notes)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Delivery", &delivery.id));
        }

        Ok(())
    }

    pub async fn delete_delivery(&self, company_id: &str, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM deliveries WHERE id = ?1 AND company_id = ?2")
            .bind(id)
            .bind(company_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Delivery", id));
        }

        Ok(())
    }

    /// Assigns a driver; the delivery moves to `assigned`.
    pub async fn assign_driver(
        &self,
        company_id: &str,
        delivery_id: &str,
        driver_id: &str,
    ) -> DbResult<()> {
        // The driver must exist in the same company.
        let driver_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM drivers WHERE id = ?1 AND company_id = ?2")
                .bind(driver_id)
                .bind(company_id)
                .fetch_one(&self.pool)
                .await?;
        if driver_count == 0 {
            return Err(DbError::not_found("Driver", driver_id));
        }

        let result = sqlx::query(
            "UPDATE deliveries SET driver_id = ?3, status = 'assigned', updated_at = ?4 \
             WHERE id = ?1 AND company_id = ?2",
        )
        .bind(delivery_id)
        .bind(company_id)
        .bind(driver_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Delivery", delivery_id));
        }

        Ok(())
    }

    /// Moves a delivery to a new status, stamping pickup/delivery times as
    /// the status passes through them.
    pub async fn update_delivery_status(
        &self,
        company_id: &str,
        delivery_id: &str,
        status: DeliveryStatus,
    ) -> DbResult<()> {
        let now = Utc::now();
        let pickup_stamp = matches!(status, DeliveryStatus::PickedUp).then_some(now);
        let delivered_stamp = matches!(status, DeliveryStatus::Delivered).then_some(now);

        let result = sqlx::query(
            "UPDATE deliveries SET status = ?3, \
             pickup_date = COALESCE(?4, pickup_date), \
             delivery_date = COALESCE(?5, delivery_date), \
             updated_at = ?6 WHERE id = ?1 AND company_id = ?2",
        )
        .bind(delivery_id)
        .bind(company_id)
        .bind(status)
        .bind(pickup_stamp)
        .bind(delivered_stamp)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Delivery", delivery_id));
        }

        Ok(())
    }

    // -------------------------------------------------------------------------
    // Delivery items
    // -------------------------------------------------------------------------

    pub async fn get_delivery_items(&self, delivery_id: &str) -> DbResult<Vec<DeliveryItem>> {
        let rows = sqlx::query_as::<_, DeliveryItem>(
            "SELECT id, delivery_id, item_id, quantity, description, condition_on_delivery, \
             created_at, updated_at FROM delivery_items WHERE delivery_id = ?1 ORDER BY id",
        )
        .bind(delivery_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn insert_delivery_item(&self, item: &DeliveryItem) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO delivery_items (id, delivery_id, item_id, quantity, description, \
             condition_on_delivery, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )
        .bind(&item.id)
        .bind(&item.delivery_id)
        .bind(&item.item_id)
        .bind(item.quantity)
        .bind(&item.description)
        .bind(&item.condition_on_delivery)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn delete_delivery_item(&self, company_id: &str, id: &str) -> DbResult<()> {
        let result = sqlx::query(
            "DELETE FROM delivery_items WHERE id = ?1 AND delivery_id IN \
             (SELECT id FROM deliveries WHERE company_id = ?2)",
        )
        .bind(id)
        .bind(company_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Delivery item", id));
        }

        Ok(())
    }

    // -------------------------------------------------------------------------
    // Routes
    // -------------------------------------------------------------------------

    pub async fn list_routes(&self, company_id: &str) -> DbResult<Vec<DeliveryRoute>> {
        let rows = sqlx::query_as::<_, DeliveryRoute>(&format!(
            "SELECT {ROUTE_COLUMNS} FROM delivery_routes \
             WHERE company_id = ?1 ORDER BY date DESC"
        ))
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn get_route(&self, company_id: &str, id: &str) -> DbResult<Option<DeliveryRoute>> {
        let row = sqlx::query_as::<_, DeliveryRoute>(&format!(
            "SELECT {ROUTE_COLUMNS} FROM delivery_routes WHERE id = ?1 AND company_id = ?2"
        ))
        .bind(id)
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn insert_route(&self, route: &DeliveryRoute) -> DbResult<()> {
        debug!(route_name = %route.route_name, "Inserting route");

        sqlx::query(&format!(
            "INSERT INTO delivery_routes ({ROUTE_COLUMNS}) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)"
        ))
        .bind(&route.id)
        .bind(&route.company_id)
        .bind(&route.route_name)
        .bind(&route.driver_id)
        .bind(route.date)
        .bind(route.status)
        .bind(&route.start_location)
        .bind(&route.end_location)
        .bind(route.total_distance_km)
        .bind(route.estimated_duration)
        .bind(route.start_time)
        .bind(route.end_time)
        .bind(&route.notes)
        .bind(route.created_at)
        .bind(route.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn update_route(&self, route: &DeliveryRoute) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE delivery_routes SET route_name = ?3, driver_id = ?4, date = ?5, \
             status = ?6, start_location = ?7, end_location = ?8, total_distance_km = ?9, \
             estimated_duration = ?10, start_time = ?11, end_time = ?12, notes = ?13, \
             updated_at = ?14 WHERE id = ?1 AND company_id = ?2",
        )
        .bind(&route.id)
        .bind(&route.company_id)
        .bind(&route.route_name)
        .bind(&route.driver_id)
        .bind(route.date)
        .bind(route.status)
        .bind(&route.start_location)
        .bind(&route.end_location)
        .bind(route.total_distance_km)
        .bind(route.estimated_duration)
        .bind(route.start_time)
        .bind(route.end_time)
        .bind(&route.notes)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Route", &route.id));
        }

        Ok(())
    }

    pub async fn delete_route(&self, company_id: &str, id: &str) -> DbResult<()> {
        let result =
            sqlx::query("DELETE FROM delivery_routes WHERE id = ?1 AND company_id = ?2")
                .bind(id)
                .bind(company_id)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Route", id));
        }

        Ok(())
    }

    /// Stops on a route, in sequence order.
    pub async fn get_route_deliveries(&self, route_id: &str) -> DbResult<Vec<RouteDelivery>> {
        let rows = sqlx::query_as::<_, RouteDelivery>(
            "SELECT id, route_id, delivery_id, sequence, estimated_arrival \
             FROM route_deliveries WHERE route_id = ?1 ORDER BY sequence",
        )
        .bind(route_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Appends a delivery to a route. With no explicit sequence it lands at
    /// the end (current stop count + 1).
    pub async fn add_delivery_to_route(
        &self,
        company_id: &str,
        route_id: &str,
        delivery_id: &str,
        sequence: Option<i64>,
    ) -> DbResult<RouteDelivery> {
        let mut tx = self.pool.begin().await?;

        let route_count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM delivery_routes WHERE id = ?1 AND company_id = ?2",
        )
        .bind(route_id)
        .bind(company_id)
        .fetch_one(&mut *tx)
        .await?;
        if route_count == 0 {
            return Err(DbError::not_found("Route", route_id));
        }

        let delivery_count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM deliveries WHERE id = ?1 AND company_id = ?2",
        )
        .bind(delivery_id)
        .bind(company_id)
        .fetch_one(&mut *tx)
        .await?;
        if delivery_count == 0 {
            return Err(DbError::not_found("Delivery", delivery_id));
        }

        let sequence = match sequence {
            Some(s) => s,
            None => {
                let stops: i64 = sqlx::query_scalar(
                    "SELECT COUNT(*) FROM route_deliveries WHERE route_id = ?1",
                )
                .bind(route_id)
                .fetch_one(&mut *tx)
                .await?;
                stops + 1
            }
        };

        let stop = RouteDelivery {
            id: crate::generate_id(),
            route_id: route_id.to_string(),
            delivery_id: delivery_id.to_string(),
            sequence,
            estimated_arrival: None,
        };

        sqlx::query(
            "INSERT INTO route_deliveries (id, route_id, delivery_id, sequence, \
             estimated_arrival) VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&stop.id)
        .bind(&stop.route_id)
        .bind(&stop.delivery_id)
        .bind(stop.sequence)
        .bind(stop.estimated_arrival)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(stop)
    }

    /// Starts route execution: in_progress, start time stamped.
    pub async fn start_route(&self, company_id: &str, id: &str) -> DbResult<()> {
        self.set_route_state(company_id, id, RouteStatus::InProgress, "start_time").await
    }

    /// Completes route execution: completed, end time stamped.
    pub async fn complete_route(&self, company_id: &str, id: &str) -> DbResult<()> {
        self.set_route_state(company_id, id, RouteStatus::Completed, "end_time").await
    }

    async fn set_route_state(
        &self,
        company_id: &str,
        id: &str,
        status: RouteStatus,
        stamp_column: &str,
    ) -> DbResult<()> {
        let result = sqlx::query(&format!(
            "UPDATE delivery_routes SET status = ?3, {stamp_column} = ?4, updated_at = ?4 \
             WHERE id = ?1 AND company_id = ?2"
        ))
        .bind(id)
        .bind(company_id)
        .bind(status)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Route", id));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::test_support::seed_company;
    use chrono::NaiveDate;
    use keel_core::{Contact, ContactType, DriverStatus};

    async fn seed_contact(db: &Database, company_id: &str) -> Contact {
        let now = Utc::now();
        let contact = Contact {
            id: crate::generate_id(),
            company_id: company_id.to_string(),
            name: "Recipient".to_string(),
            email: None,
            phone: None,
            mobile: None,
            address: None,
            city: None,
            postal_code: None,
            country: None,
            company_name: None,
            position: None,
            website: None,
            contact_type: ContactType::Customer,
            notes: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        db.contacts().insert(&contact).await.unwrap();
        contact
    }

    fn driver(company_id: &str, phone: &str) -> Driver {
        let now = Utc::now();
        Driver {
            id: crate::generate_id(),
            company_id: company_id.to_string(),
            name: "Driver".to_string(),
            phone: phone.to_string(),
            email: None,
            vehicle_type: None,
            vehicle_plate: None,
            license_number: None,
            status: DriverStatus::Available,
            is_active: true,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn delivery(company_id: &str, customer_id: &str, number: &str) -> Delivery {
        let now = Utc::now();
        Delivery {
            id: crate::generate_id(),
            company_id: company_id.to_string(),
            delivery_number: number.to_string(),
            sales_order_id: None,
            customer_id: customer_id.to_string(),
            driver_id: None,
            pickup_address: "Depot".to_string(),
            delivery_address: "Main St 1".to_string(),
            customer_phone: None,
            scheduled_date: NaiveDate::from_ymd_opt(2026, 8, 10).unwrap(),
            scheduled_time: None,
            pickup_date: None,
            delivery_date: None,
            status: DeliveryStatus::Pending,
            priority: 1,
            distance_km: None,
            delivery_fee_cents: 0,
            tracking_code: None,
            signature: None,
            notes: None,
            internal_notes: None,
            created_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_assign_driver_moves_to_assigned() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let company_id = seed_company(&db).await;
        let customer = seed_contact(&db, &company_id).await;
        let repo = db.delivery();

        let d = driver(&company_id, "555-0001");
        repo.insert_driver(&d).await.unwrap();
        let del = delivery(&company_id, &customer.id, "DEL-0001");
        repo.insert_delivery(&del).await.unwrap();

        assert_eq!(repo.list_pending(&company_id).await.unwrap().len(), 1);

        repo.assign_driver(&company_id, &del.id, &d.id).await.unwrap();
        let updated = repo.get_delivery(&company_id, &del.id).await.unwrap().unwrap();
        assert_eq!(updated.status, DeliveryStatus::Assigned);
        assert_eq!(updated.driver_id.as_deref(), Some(d.id.as_str()));
        assert!(repo.list_pending(&company_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_status_transitions_stamp_times() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let company_id = seed_company(&db).await;
        let customer = seed_contact(&db, &company_id).await;
        let repo = db.delivery();

        let del = delivery(&company_id, &customer.id, "DEL-0001");
        repo.insert_delivery(&del).await.unwrap();

        repo.update_delivery_status(&company_id, &del.id, DeliveryStatus::PickedUp)
            .await
            .unwrap();
        assert_eq!(repo.list_in_transit(&company_id).await.unwrap().len(), 1);

        repo.update_delivery_status(&company_id, &del.id, DeliveryStatus::Delivered)
            .await
            .unwrap();
        let done = repo.get_delivery(&company_id, &del.id).await.unwrap().unwrap();
        assert!(done.pickup_date.is_some());
        assert!(done.delivery_date.is_some());
        assert!(repo.list_in_transit(&company_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_route_stops_sequence() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let company_id = seed_company(&db).await;
        let customer = seed_contact(&db, &company_id).await;
        let repo = db.delivery();

        let now = Utc::now();
        let route = DeliveryRoute {
            id: crate::generate_id(),
            company_id: company_id.clone(),
            route_name: "North loop".to_string(),
            driver_id: None,
            date: NaiveDate::from_ymd_opt(2026, 8, 10).unwrap(),
            status: RouteStatus::Planned,
            start_location: None,
            end_location: None,
            total_distance_km: 0,
            estimated_duration: 0,
            start_time: None,
            end_time: None,
            notes: None,
            created_at: now,
            updated_at: now,
        };
        repo.insert_route(&route).await.unwrap();

        let first = delivery(&company_id, &customer.id, "DEL-0001");
        let second = delivery(&company_id, &customer.id, "DEL-0002");
        repo.insert_delivery(&first).await.unwrap();
        repo.insert_delivery(&second).await.unwrap();

        let stop1 = repo
            .add_delivery_to_route(&company_id, &route.id, &first.id, None)
            .await
            .unwrap();
        let stop2 = repo
            .add_delivery_to_route(&company_id, &route.id, &second.id, None)
            .await
            .unwrap();
        assert_eq!(stop1.sequence, 1);
        assert_eq!(stop2.sequence, 2);

        repo.start_route(&company_id, &route.id).await.unwrap();
        repo.complete_route(&company_id, &route.id).await.unwrap();
        let finished = repo.get_route(&company_id, &route.id).await.unwrap().unwrap();
        assert_eq!(finished.status, RouteStatus::Completed);
        assert!(finished.start_time.is_some());
        assert!(finished.end_time.is_some());
    }
}
