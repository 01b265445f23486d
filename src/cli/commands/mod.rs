mod create_superuser;

pub use create_superuser::cmd_create_superuser;
