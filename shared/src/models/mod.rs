//! Data models for the Comanda backend

pub mod customer;
pub mod dining_table;
pub mod ledger;
pub mod menu_item;
pub mod order;
pub mod tenant;

pub use customer::{Customer, CustomerPatch};
pub use dining_table::{DiningTable, DiningTablePatch};
pub use ledger::{EntityKind, LedgerEntry, Operation, ORDERS_KIND};
pub use menu_item::{MenuItem, MenuItemPatch};
pub use order::{CreateOrder, Order, OrderLine, OrderLineInput, OrderStatus};
pub use tenant::Tenant;
