//! Core TableHaus functionality
//!
//! [`TableHaus`] owns the shared [`ConnectionManager`] and the registry of
//! compiled entity types. Each type is registered once by name and handed
//! back as a cheap, cloneable handle.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use config::{AppConfig, DatabaseConfig};
use connection_manager::{ConnectionManager, OnShutdown};
use entity_schema::{EntityKind, FieldDescriptor, JoinSource};

use crate::errors::TableHausError;
use crate::projection::JoinedProjection;
use crate::table::BaseTable;
use crate::view::View;

#[derive(Debug, Clone)]
enum Registered {
    Table(BaseTable),
    View(View),
    Projection(JoinedProjection),
}

impl Registered {
    fn kind(&self) -> EntityKind {
        match self {
            Registered::Table(_) => EntityKind::BaseTable,
            Registered::View(_) => EntityKind::View,
            Registered::Projection(_) => EntityKind::JoinedProjection,
        }
    }
}

/// Main TableHaus coordinator that manages the connection manager and entity types
pub struct TableHaus {
    manager: Arc<ConnectionManager>,
    entities: HashMap<String, Registered>,
}

impl TableHaus {
    /// Create a coordinator; the pool opens on first use
    pub fn new(config: DatabaseConfig) -> Self {
        Self::with_manager(Arc::new(ConnectionManager::new(config)))
    }

    /// Share an existing connection manager
    pub fn with_manager(manager: Arc<ConnectionManager>) -> Self {
        Self {
            manager,
            entities: HashMap::new(),
        }
    }

    /// Build from the configuration file located by [`AppConfig::load`]
    pub fn from_config() -> Result<Self, TableHausError> {
        let config = AppConfig::load()?;
        Ok(Self::new(config.database))
    }

    pub fn manager(&self) -> &Arc<ConnectionManager> {
        &self.manager
    }

    fn ensure_free(&self, name: &str) -> Result<(), TableHausError> {
        if self.entities.contains_key(name) {
            return Err(TableHausError::EntityAlreadyRegistered(name.to_string()));
        }
        Ok(())
    }

    pub fn register_table(
        &mut self,
        table: &str,
        fields: Vec<FieldDescriptor>,
    ) -> Result<BaseTable, TableHausError> {
        self.ensure_free(table)?;
        let handle = BaseTable::declare(table, fields)?;
        self.entities
            .insert(table.to_string(), Registered::Table(handle.clone()));
        tracing::debug!(entity = %table, "registered table");
        Ok(handle)
    }

    pub fn register_view(
        &mut self,
        view: &str,
        fields: Vec<FieldDescriptor>,
    ) -> Result<View, TableHausError> {
        self.ensure_free(view)?;
        let handle = View::declare(view, fields)?;
        self.entities
            .insert(view.to_string(), Registered::View(handle.clone()));
        tracing::debug!(entity = %view, "registered view");
        Ok(handle)
    }

    pub fn register_projection(
        &mut self,
        name: &str,
        sources: &[JoinSource],
        fields: Vec<FieldDescriptor>,
    ) -> Result<JoinedProjection, TableHausError> {
        self.ensure_free(name)?;
        let handle = JoinedProjection::declare(name, sources, fields)?;
        self.entities
            .insert(name.to_string(), Registered::Projection(handle.clone()));
        tracing::debug!(entity = %name, "registered joined projection");
        Ok(handle)
    }

    fn lookup(&self, name: &str) -> Result<&Registered, TableHausError> {
        self.entities
            .get(name)
            .ok_or_else(|| TableHausError::EntityNotRegistered(name.to_string()))
    }

    fn wrong_kind(name: &str, expected: EntityKind, found: &Registered) -> TableHausError {
        TableHausError::WrongKind {
            name: name.to_string(),
            expected,
            actual: found.kind(),
        }
    }

    /// Get a registered table by name
    pub fn table(&self, name: &str) -> Result<BaseTable, TableHausError> {
        match self.lookup(name)? {
            Registered::Table(table) => Ok(table.clone()),
            other => Err(Self::wrong_kind(name, EntityKind::BaseTable, other)),
        }
    }

    pub fn view(&self, name: &str) -> Result<View, TableHausError> {
        match self.lookup(name)? {
            Registered::View(view) => Ok(view.clone()),
            other => Err(Self::wrong_kind(name, EntityKind::View, other)),
        }
    }

    pub fn projection(&self, name: &str) -> Result<JoinedProjection, TableHausError> {
        match self.lookup(name)? {
            Registered::Projection(projection) => Ok(projection.clone()),
            other => Err(Self::wrong_kind(name, EntityKind::JoinedProjection, other)),
        }
    }

    /// Kind of a registered entity type
    pub fn kind_of(&self, name: &str) -> Option<EntityKind> {
        self.entities.get(name).map(Registered::kind)
    }

    /// List all registered entity names
    pub fn list_entities(&self) -> Vec<&String> {
        self.entities.keys().collect()
    }

    /// Remove an entity type by name
    pub fn unregister(&mut self, name: &str) -> Result<(), TableHausError> {
        self.entities
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| TableHausError::EntityNotRegistered(name.to_string()))
    }

    /// Check database connection health
    pub async fn health_check(&self) -> Result<(), TableHausError> {
        self.manager.health_check().await?;
        Ok(())
    }
}

#[async_trait]
impl OnShutdown for TableHaus {
    async fn on_shutdown(&self) {
        tracing::info!(entities = self.entities.len(), "shutting down");
        self.manager.on_shutdown().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use entity_schema::SchemaError;

    fn order_fields() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::string("id").primary_key(),
            FieldDescriptor::float("total"),
        ]
    }

    #[test]
    fn test_register_and_lookup() {
        let mut haus = TableHaus::new(DatabaseConfig::default());
        let orders = haus.register_table("orders", order_fields()).unwrap();
        haus.register_view("order_totals", vec![FieldDescriptor::float("sum_total")])
            .unwrap();

        assert_eq!(haus.table("orders").unwrap().name(), orders.name());
        assert_eq!(haus.kind_of("order_totals"), Some(EntityKind::View));
        assert_eq!(haus.list_entities().len(), 2);

        assert!(matches!(
            haus.view("orders"),
            Err(TableHausError::WrongKind {
                expected: EntityKind::View,
                actual: EntityKind::BaseTable,
                ..
            })
        ));
        assert!(matches!(
            haus.projection("missing"),
            Err(TableHausError::EntityNotRegistered(_))
        ));
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut haus = TableHaus::new(DatabaseConfig::default());
        haus.register_table("orders", order_fields()).unwrap();
        assert!(matches!(
            haus.register_table("orders", order_fields()),
            Err(TableHausError::EntityAlreadyRegistered(_))
        ));

        haus.unregister("orders").unwrap();
        assert!(haus.register_table("orders", order_fields()).is_ok());
        assert!(haus.unregister("nope").is_err());
    }

    #[test]
    fn test_schema_errors_leave_registry_untouched() {
        let mut haus = TableHaus::new(DatabaseConfig::default());
        let err = haus
            .register_table("logs", vec![FieldDescriptor::text("line")])
            .unwrap_err();
        assert!(matches!(
            err,
            TableHausError::Schema(SchemaError::MissingPrimaryKey { .. })
        ));
        assert!(haus.kind_of("logs").is_none());
    }

    #[tokio::test]
    async fn test_shutdown_without_connection() {
        let haus = TableHaus::new(DatabaseConfig::default());
        haus.on_shutdown().await;
        assert!(!haus.manager().is_connected().await);
    }
}
