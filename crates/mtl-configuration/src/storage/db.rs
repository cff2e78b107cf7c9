//! `SQLite` database handle for the configuration service.

mtl_core::define_database!(
    ConfigurationDatabase,
    "Configuration database migrations complete"
);
