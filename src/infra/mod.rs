pub mod firestore;
pub mod slack;
