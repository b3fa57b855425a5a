pub mod contact;
pub mod user;

pub use contact::{Address, AddressDraft, Contact, ContactDraft, PhoneNumber};
pub use user::{NewUser, User, UserChanges};
