use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 创建成绩记录表
        manager
            .create_table(
                Table::create()
                    .table(GradeRecords::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(GradeRecords::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(GradeRecords::StudentId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(GradeRecords::CourseId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(GradeRecords::EvaluationType)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(GradeRecords::Score).double().not_null())
                    .col(ColumnDef::new(GradeRecords::Weight).double().not_null())
                    .col(ColumnDef::new(GradeRecords::Status).string().not_null())
                    .col(ColumnDef::new(GradeRecords::Term).string().not_null())
                    .col(
                        ColumnDef::new(GradeRecords::AcademicYear)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(GradeRecords::SubmittedBy)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(GradeRecords::SubmittedByRole)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(GradeRecords::ValidatedBy)
                            .big_integer()
                            .null(),
                    )
                    .col(ColumnDef::new(GradeRecords::Comment).text().null())
                    .col(ColumnDef::new(GradeRecords::RejectionComment).text().null())
                    .col(
                        ColumnDef::new(GradeRecords::SubmittedAt)
                            .big_integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(GradeRecords::ValidatedAt)
                            .big_integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(GradeRecords::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(GradeRecords::UpdatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(GradeRecords::DeletedAt).big_integer().null())
                    .check(Expr::col(GradeRecords::Score).between(0.0, 20.0))
                    .check(Expr::col(GradeRecords::Weight).gt(0.0))
                    .to_owned(),
            )
            .await?;

        // 创建成绩单表
        manager
            .create_table(
                Table::create()
                    .table(Bulletins::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Bulletins::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Bulletins::StudentId).big_integer().not_null())
                    .col(ColumnDef::new(Bulletins::ProgramId).big_integer().not_null())
                    .col(ColumnDef::new(Bulletins::Term).string().not_null())
                    .col(ColumnDef::new(Bulletins::AcademicYear).string().not_null())
                    .col(ColumnDef::new(Bulletins::Average).double().null())
                    .col(ColumnDef::new(Bulletins::Rank).integer().null())
                    .col(
                        ColumnDef::new(Bulletins::CohortSize)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Bulletins::Eligible)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Bulletins::GeneratedBy)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Bulletins::GeneratedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // 创建索引
        // 成绩记录表索引
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_grade_records_student_term")
                    .table(GradeRecords::Table)
                    .col(GradeRecords::StudentId)
                    .col(GradeRecords::Term)
                    .col(GradeRecords::AcademicYear)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_grade_records_course_id")
                    .table(GradeRecords::Table)
                    .col(GradeRecords::CourseId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_grade_records_status")
                    .table(GradeRecords::Table)
                    .col(GradeRecords::Status)
                    .to_owned(),
            )
            .await?;

        // 成绩单唯一索引：每个学生每学期每个专业只有一份
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_bulletins_scope")
                    .table(Bulletins::Table)
                    .col(Bulletins::StudentId)
                    .col(Bulletins::ProgramId)
                    .col(Bulletins::Term)
                    .col(Bulletins::AcademicYear)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Bulletins::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(GradeRecords::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum GradeRecords {
    #[sea_orm(iden = "grade_records")]
    Table,
    Id,
    StudentId,
    CourseId,
    EvaluationType,
    Score,
    Weight,
    Status,
    Term,
    AcademicYear,
    SubmittedBy,
    SubmittedByRole,
    ValidatedBy,
    Comment,
    RejectionComment,
    SubmittedAt,
    ValidatedAt,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
}

#[derive(DeriveIden)]
enum Bulletins {
    #[sea_orm(iden = "bulletins")]
    Table,
    Id,
    StudentId,
    ProgramId,
    Term,
    AcademicYear,
    Average,
    Rank,
    CohortSize,
    Eligible,
    GeneratedBy,
    GeneratedAt,
}
