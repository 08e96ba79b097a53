pub mod memory;
pub mod store;
pub mod supabase;
pub mod supabase_store;

pub use memory::InMemoryStore;
pub use store::{ClinicStore, StatusChange, StatusWrite, StoreError};
pub use supabase::{SupabaseApiError, SupabaseClient};
pub use supabase_store::SupabaseStore;
