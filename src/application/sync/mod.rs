//! Cart and wishlist synchronization.
//!
//! Each coordinator owns one aggregate and swaps between a guest store and a
//! server-backed store as the session changes. Local state is always updated
//! first; server responses reconcile it only while they are still current.

mod cart_sync;
mod clock;
mod error;
mod migration;
mod snapshot;
mod store;
mod wishlist_sync;

pub use cart_sync::CartSync;
pub use clock::{MutationClock, MutationTicket};
pub use error::SyncError;
pub use migration::{MigrationLedger, SkuKey};
pub use snapshot::{read_items, write_items, Snapshot};
pub use store::{
    CartMutation, CartStore, LocalOnlyStore, RemoteBackedStore, WishlistMutation, WishlistStore,
};
pub use wishlist_sync::WishlistSync;
