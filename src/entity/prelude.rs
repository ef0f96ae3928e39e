//! 预导入模块，方便使用

pub use super::bulletins::{
    ActiveModel as BulletinActiveModel, Entity as Bulletins, Model as BulletinModel,
};
pub use super::grade_records::{
    ActiveModel as GradeRecordActiveModel, Entity as GradeRecords, Model as GradeRecordModel,
};
pub use super::slot_conflicts::{
    ActiveModel as SlotConflictActiveModel, Entity as SlotConflicts, Model as SlotConflictModel,
};
pub use super::timetable_slots::{
    ActiveModel as TimetableSlotActiveModel, Entity as TimetableSlots,
    Model as TimetableSlotModel,
};
