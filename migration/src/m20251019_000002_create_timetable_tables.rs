use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 创建课表时段表
        manager
            .create_table(
                Table::create()
                    .table(TimetableSlots::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TimetableSlots::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(TimetableSlots::CourseId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TimetableSlots::TeacherId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TimetableSlots::RoomId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TimetableSlots::ProgramId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TimetableSlots::DayOfWeek)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TimetableSlots::StartMinute)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TimetableSlots::EndMinute)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TimetableSlots::WeekNumber)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TimetableSlots::AcademicYear)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(TimetableSlots::SlotType).string().not_null())
                    .col(
                        ColumnDef::new(TimetableSlots::CreatedBy)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TimetableSlots::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TimetableSlots::UpdatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    // 分钟数落在一天之内且开始早于结束
                    .check(Expr::col(TimetableSlots::StartMinute).gte(0))
                    .check(Expr::col(TimetableSlots::EndMinute).lte(24 * 60))
                    .check(
                        Expr::col(TimetableSlots::StartMinute)
                            .lt(Expr::col(TimetableSlots::EndMinute)),
                    )
                    .to_owned(),
            )
            .await?;

        // 创建课表冲突记录表
        manager
            .create_table(
                Table::create()
                    .table(SlotConflicts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SlotConflicts::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SlotConflicts::SlotId).big_integer().not_null())
                    .col(
                        ColumnDef::new(SlotConflicts::ConflictingSlotId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(SlotConflicts::Dimension).string().not_null())
                    .col(
                        ColumnDef::new(SlotConflicts::DetectedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SlotConflicts::Resolved)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(SlotConflicts::Table, SlotConflicts::SlotId)
                            .to(TimetableSlots::Table, TimetableSlots::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(SlotConflicts::Table, SlotConflicts::ConflictingSlotId)
                            .to(TimetableSlots::Table, TimetableSlots::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 候选时段查询走 (学年, 周次, 星期) 复合索引
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_timetable_slots_day_key")
                    .table(TimetableSlots::Table)
                    .col(TimetableSlots::AcademicYear)
                    .col(TimetableSlots::WeekNumber)
                    .col(TimetableSlots::DayOfWeek)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_timetable_slots_teacher_id")
                    .table(TimetableSlots::Table)
                    .col(TimetableSlots::TeacherId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_timetable_slots_program_id")
                    .table(TimetableSlots::Table)
                    .col(TimetableSlots::ProgramId)
                    .col(TimetableSlots::AcademicYear)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_slot_conflicts_slot_id")
                    .table(SlotConflicts::Table)
                    .col(SlotConflicts::SlotId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 按照创建的相反顺序删除
        manager
            .drop_table(Table::drop().table(SlotConflicts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(TimetableSlots::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum TimetableSlots {
    #[sea_orm(iden = "timetable_slots")]
    Table,
    Id,
    CourseId,
    TeacherId,
    RoomId,
    ProgramId,
    DayOfWeek,
    StartMinute,
    EndMinute,
    WeekNumber,
    AcademicYear,
    SlotType,
    CreatedBy,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum SlotConflicts {
    #[sea_orm(iden = "slot_conflicts")]
    Table,
    Id,
    SlotId,
    ConflictingSlotId,
    Dimension,
    DetectedAt,
    Resolved,
}
