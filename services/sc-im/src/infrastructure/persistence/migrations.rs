//! 数据库迁移定义
//!
//! 服务启动时由 MigrationManager 按版本号升序应用。

use adapter_postgres::Migration;

/// sc-im 服务的全部迁移
pub fn migrations() -> Vec<Migration> {
    vec![
        Migration::new(
            1,
            "create_stock_records",
            r#"
            CREATE TABLE IF NOT EXISTS stock_records (
                id UUID PRIMARY KEY,
                tenant_id UUID NOT NULL,
                material_id UUID NOT NULL,
                plant VARCHAR(50) NOT NULL,
                storage_location VARCHAR(50),
                batch_number VARCHAR(100),
                quantity_on_hand BIGINT NOT NULL DEFAULT 0,
                quantity_reserved BIGINT NOT NULL DEFAULT 0,
                quantity_in_transit BIGINT NOT NULL DEFAULT 0,
                quantity_in_production BIGINT NOT NULL DEFAULT 0,
                min_stock_level BIGINT,
                max_stock_level BIGINT,
                average_cost NUMERIC(19, 6),
                batch_date TIMESTAMPTZ,
                expiry_date TIMESTAMPTZ,
                last_movement_at TIMESTAMPTZ,
                status SMALLINT NOT NULL DEFAULT 1,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                created_by UUID,
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_by UUID,
                CONSTRAINT chk_stock_records_quantities CHECK (
                    quantity_on_hand >= 0
                    AND quantity_in_transit >= 0
                    AND quantity_in_production >= 0
                ),
                CONSTRAINT chk_stock_records_reserved CHECK (
                    quantity_reserved >= 0 AND quantity_reserved <= quantity_on_hand
                )
            );

            CREATE UNIQUE INDEX IF NOT EXISTS uq_stock_records_key
                ON stock_records (
                    tenant_id, material_id, plant,
                    COALESCE(storage_location, ''), COALESCE(batch_number, '')
                );
            "#,
        ),
        Migration::new(
            2,
            "create_stock_movements",
            r#"
            CREATE TABLE IF NOT EXISTS stock_movements (
                id UUID PRIMARY KEY,
                tenant_id UUID NOT NULL,
                stock_record_id UUID REFERENCES stock_records(id) ON DELETE SET NULL,
                material_id UUID NOT NULL,
                plant VARCHAR(50) NOT NULL,
                storage_location VARCHAR(50),
                batch_number VARCHAR(100),
                movement_type SMALLINT NOT NULL,
                document_number VARCHAR(100) NOT NULL,
                quantity_delta BIGINT NOT NULL,
                stock_before BIGINT NOT NULL,
                stock_after BIGINT NOT NULL,
                unit_cost NUMERIC(19, 6),
                remarks VARCHAR(500),
                posted_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                posted_by UUID
            );

            CREATE INDEX IF NOT EXISTS idx_stock_movements_document
                ON stock_movements (tenant_id, document_number);
            CREATE INDEX IF NOT EXISTS idx_stock_movements_posted_at
                ON stock_movements (tenant_id, posted_at DESC);
            CREATE INDEX IF NOT EXISTS idx_stock_movements_material
                ON stock_movements (tenant_id, material_id, plant);
            "#,
        ),
        Migration::new(
            3,
            "create_stock_reservations",
            r#"
            CREATE TABLE IF NOT EXISTS stock_reservations (
                id UUID PRIMARY KEY,
                tenant_id UUID NOT NULL,
                reservation_number VARCHAR(50) NOT NULL,
                stock_record_id UUID NOT NULL REFERENCES stock_records(id),
                material_id UUID NOT NULL,
                plant VARCHAR(50) NOT NULL,
                storage_location VARCHAR(50),
                reservation_type SMALLINT NOT NULL,
                status SMALLINT NOT NULL DEFAULT 1,
                quantity_reserved BIGINT NOT NULL,
                quantity_released BIGINT NOT NULL DEFAULT 0,
                reference_number VARCHAR(100) NOT NULL,
                expires_at TIMESTAMPTZ,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                created_by UUID,
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_by UUID,
                CONSTRAINT chk_stock_reservations_quantities CHECK (
                    quantity_reserved > 0
                    AND quantity_released >= 0
                    AND quantity_released <= quantity_reserved
                )
            );

            CREATE UNIQUE INDEX IF NOT EXISTS uq_stock_reservations_number
                ON stock_reservations (tenant_id, reservation_number);
            CREATE INDEX IF NOT EXISTS idx_stock_reservations_record
                ON stock_reservations (stock_record_id);
            CREATE INDEX IF NOT EXISTS idx_stock_reservations_expiry
                ON stock_reservations (status, expires_at);
            "#,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_versions_ascending_and_unique() {
        let migrations = migrations();
        assert!(!migrations.is_empty());
        for pair in migrations.windows(2) {
            assert!(pair[0].version < pair[1].version);
        }
    }

    #[test]
    fn test_each_migration_creates_its_table() {
        for migration in migrations() {
            assert!(migration.up_sql.contains("CREATE TABLE IF NOT EXISTS"));
            assert!(!migration.checksum.is_empty());
        }
    }
}
