pub mod a001_condominium;
pub mod a002_block;
pub mod a003_apartment;
pub mod a004_resident;
