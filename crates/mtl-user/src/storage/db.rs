//! `SQLite` database handle for the user service.

mtl_core::define_database!(UserDatabase, "User database migrations complete");
