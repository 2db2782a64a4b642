//! Legacy JSON to YAML profile merging and migration

pub mod merger;
pub mod migration;

pub use merger::{merged_source, validate_merged_config, ConfigMerger, MergeConflict, MergeSide};
pub use migration::{
    convert_hook_list, convert_hooks, convert_json_to_yaml_config, create_migration_report,
    MigrationReport,
};
