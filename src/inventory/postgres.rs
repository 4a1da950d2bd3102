use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgPoolOptions, postgres::PgRow};

use crate::inventory::{
    error::{InventoryError, backend_error, not_found},
    store::InventoryStore,
    types::{Item, ItemPatch, Machine, Slot, SlotPatch},
};

/// Persistent inventory store over Postgres. Single-table operations only; no
/// cross-table transaction guarantees are assumed by callers.
#[derive(Debug, Clone)]
pub struct PgInventoryStore {
    pool: PgPool,
}

impl PgInventoryStore {
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, InventoryError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect(database_url)
            .await
            .map_err(|e| backend_error(format!("postgres connect failed: {}", e)))?;

        Ok(Self { pool })
    }

    pub async fn ensure_schema(&self) -> Result<(), InventoryError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS machines (
                id SERIAL PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                display_name TEXT NOT NULL DEFAULT 'New Machine'
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| backend_error(format!("postgres schema create failed: {}", e)))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS items (
                id SERIAL PRIMARY KEY,
                name TEXT NOT NULL,
                price BIGINT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| backend_error(format!("postgres schema create failed: {}", e)))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS slots (
                machine_id INTEGER NOT NULL REFERENCES machines (id),
                number INTEGER NOT NULL,
                item_id INTEGER NULL REFERENCES items (id),
                active BOOLEAN NOT NULL DEFAULT FALSE,
                count INTEGER NULL,
                PRIMARY KEY (machine_id, number)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| backend_error(format!("postgres schema create failed: {}", e)))?;

        Ok(())
    }

    async fn machine_id(&self, machine_name: &str) -> Result<i32, InventoryError> {
        let row = sqlx::query("SELECT id FROM machines WHERE name = $1")
            .bind(machine_name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| backend_error(format!("postgres machine lookup failed: {}", e)))?
            .ok_or_else(|| not_found(format!("no machine named '{}'", machine_name)))?;

        row.try_get("id")
            .map_err(|e| backend_error(format!("postgres decode id failed: {}", e)))
    }
}

fn decode_machine(row: &PgRow) -> Result<Machine, InventoryError> {
    Ok(Machine {
        id: row
            .try_get("id")
            .map_err(|e| backend_error(format!("postgres decode id failed: {}", e)))?,
        name: row
            .try_get("name")
            .map_err(|e| backend_error(format!("postgres decode name failed: {}", e)))?,
        display_name: row
            .try_get("display_name")
            .map_err(|e| backend_error(format!("postgres decode display_name failed: {}", e)))?,
    })
}

fn decode_item(row: &PgRow) -> Result<Item, InventoryError> {
    Ok(Item {
        id: row
            .try_get("id")
            .map_err(|e| backend_error(format!("postgres decode id failed: {}", e)))?,
        name: row
            .try_get("name")
            .map_err(|e| backend_error(format!("postgres decode name failed: {}", e)))?,
        price: row
            .try_get("price")
            .map_err(|e| backend_error(format!("postgres decode price failed: {}", e)))?,
    })
}

fn decode_slot(row: &PgRow) -> Result<Slot, InventoryError> {
    let item_id: Option<i32> = row
        .try_get("item_id")
        .map_err(|e| backend_error(format!("postgres decode item_id failed: {}", e)))?;

    let item = match item_id {
        Some(id) => Some(Item {
            id,
            name: row
                .try_get("item_name")
                .map_err(|e| backend_error(format!("postgres decode item_name failed: {}", e)))?,
            price: row
                .try_get("item_price")
                .map_err(|e| backend_error(format!("postgres decode item_price failed: {}", e)))?,
        }),
        None => None,
    };

    Ok(Slot {
        machine_id: row
            .try_get("machine_id")
            .map_err(|e| backend_error(format!("postgres decode machine_id failed: {}", e)))?,
        number: row
            .try_get("number")
            .map_err(|e| backend_error(format!("postgres decode number failed: {}", e)))?,
        item,
        active: row
            .try_get("active")
            .map_err(|e| backend_error(format!("postgres decode active failed: {}", e)))?,
        count: row
            .try_get("count")
            .map_err(|e| backend_error(format!("postgres decode count failed: {}", e)))?,
    })
}

#[async_trait]
impl InventoryStore for PgInventoryStore {
    async fn get_machine(&self, name: &str) -> Result<Option<Machine>, InventoryError> {
        let row = sqlx::query("SELECT id, name, display_name FROM machines WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| backend_error(format!("postgres machine lookup failed: {}", e)))?;

        row.as_ref().map(decode_machine).transpose()
    }

    async fn list_machines(&self) -> Result<Vec<Machine>, InventoryError> {
        let rows = sqlx::query("SELECT id, name, display_name FROM machines ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| backend_error(format!("postgres machine list failed: {}", e)))?;

        rows.iter().map(decode_machine).collect()
    }

    async fn list_slots(&self, machine_name: &str) -> Result<Vec<Slot>, InventoryError> {
        let machine_id = self.machine_id(machine_name).await?;

        let rows = sqlx::query(
            r#"
            SELECT
                s.machine_id,
                s.number,
                s.item_id,
                s.active,
                s.count,
                i.name AS item_name,
                i.price AS item_price
            FROM slots s
            LEFT JOIN items i ON i.id = s.item_id
            WHERE s.machine_id = $1
            ORDER BY s.number ASC
            "#,
        )
        .bind(machine_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| backend_error(format!("postgres slot list failed: {}", e)))?;

        rows.iter().map(decode_slot).collect()
    }

    async fn get_item(&self, id: i32) -> Result<Option<Item>, InventoryError> {
        let row = sqlx::query("SELECT id, name, price FROM items WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| backend_error(format!("postgres item lookup failed: {}", e)))?;

        row.as_ref().map(decode_item).transpose()
    }

    async fn list_items(&self) -> Result<Vec<Item>, InventoryError> {
        let rows = sqlx::query("SELECT id, name, price FROM items ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| backend_error(format!("postgres item list failed: {}", e)))?;

        rows.iter().map(decode_item).collect()
    }

    async fn create_item(&self, name: &str, price: i64) -> Result<Item, InventoryError> {
        let row =
            sqlx::query("INSERT INTO items (name, price) VALUES ($1, $2) RETURNING id, name, price")
                .bind(name)
                .bind(price)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| backend_error(format!("postgres item insert failed: {}", e)))?;

        decode_item(&row)
    }

    async fn update_item(&self, id: i32, patch: ItemPatch) -> Result<Item, InventoryError> {
        let row = sqlx::query(
            r#"
            UPDATE items
            SET name = COALESCE($2, name), price = COALESCE($3, price)
            WHERE id = $1
            RETURNING id, name, price
            "#,
        )
        .bind(id)
        .bind(patch.name)
        .bind(patch.price)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| backend_error(format!("postgres item update failed: {}", e)))?
        .ok_or_else(|| not_found(format!("no item with id {}", id)))?;

        decode_item(&row)
    }

    async fn delete_item(&self, id: i32) -> Result<(), InventoryError> {
        let result = sqlx::query("DELETE FROM items WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| backend_error(format!("postgres item delete failed: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(not_found(format!("no item with id {}", id)));
        }
        Ok(())
    }

    async fn update_slot(
        &self,
        machine_name: &str,
        number: i32,
        patch: SlotPatch,
    ) -> Result<Slot, InventoryError> {
        let machine_id = self.machine_id(machine_name).await?;

        let result = sqlx::query(
            r#"
            UPDATE slots
            SET
                item_id = COALESCE($3, item_id),
                active = COALESCE($4, active),
                count = CASE WHEN $5 THEN $6 ELSE count END
            WHERE machine_id = $1 AND number = $2
            "#,
        )
        .bind(machine_id)
        .bind(number)
        .bind(patch.item_id)
        .bind(patch.active)
        .bind(patch.count.is_some())
        .bind(patch.count.flatten())
        .execute(&self.pool)
        .await
        .map_err(|e| backend_error(format!("postgres slot update failed: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(not_found(format!(
                "machine '{}' has no slot number {}",
                machine_name, number
            )));
        }

        let slots = self.list_slots(machine_name).await?;
        slots
            .into_iter()
            .find(|s| s.number == number)
            .ok_or_else(|| backend_error("updated slot vanished during re-read"))
    }

    async fn adjust_slot_after_dispense(
        &self,
        machine_id: i32,
        number: i32,
    ) -> Result<(), InventoryError> {
        sqlx::query(
            r#"
            UPDATE slots
            SET
                count = GREATEST(count - 1, 0),
                active = active AND count > 1
            WHERE machine_id = $1 AND number = $2 AND count IS NOT NULL
            "#,
        )
        .bind(machine_id)
        .bind(number)
        .execute(&self.pool)
        .await
        .map_err(|e| backend_error(format!("postgres slot adjust failed: {}", e)))?;

        Ok(())
    }
}
