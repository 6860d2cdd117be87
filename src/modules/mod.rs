pub mod cataloguing;
