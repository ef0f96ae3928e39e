pub mod bulletins;
pub mod grades;
pub mod notifications;
pub mod timetable;
pub mod users;
