use anyhow::Result;
use sqlx::{Connection, PgConnection};

use super::CourseLoad;
use crate::model::{Course, Program};

const CREATE_PROGRAM: &str = r#"
    CREATE TABLE IF NOT EXISTS "program" (
        "programid" VARCHAR(255) PRIMARY KEY,
        "title" VARCHAR(255),
        "studyprogcode" VARCHAR(255),
        "studyprogname" VARCHAR(255),
        "studyprogstudylevel" VARCHAR(255),
        "studyprogstudylevelcode" VARCHAR(255)
    )
"#;

const CREATE_COURSE: &str = r#"
    CREATE TABLE IF NOT EXISTS "course" (
        "courseid" VARCHAR(255) PRIMARY KEY,
        "name" VARCHAR(255),
        "ownerid" INT,
        "showtype" BOOLEAN,
        "detailtype" VARCHAR(255),
        "name_en" VARCHAR(255),
        "name_nn" VARCHAR(255),
        "coursetype" VARCHAR(255),
        "tpsort" VARCHAR(255),
        "showdiscipline" BOOLEAN,
        "campusid" VARCHAR(255),
        "yearfrom_und" INT,
        "seasonfrom_und" VARCHAR(255),
        "yearto_und" VARCHAR(255),
        "seasonto_und" VARCHAR(255),
        "yearfrom_ex" INT,
        "seasonfrom_ex" VARCHAR(255),
        "yearto_ex" VARCHAR(255),
        "seasonto_ex" VARCHAR(255),
        "departmentid_secondary" INT,
        "create_activity_zoom" BOOLEAN,
        "authorized_netgroups" VARCHAR(255),
        "tpn_copy_daytime" BOOLEAN,
        "nofterms" INT,
        "terminnr" INT,
        "fullname" VARCHAR(255),
        "fullname_en" VARCHAR(255),
        "fullname_nn" VARCHAR(255),
        "idtermin" VARCHAR(255)
    )
"#;

const INSERT_PROGRAM: &str = r#"
    INSERT INTO "program" (
        "programid", "title", "studyprogcode", "studyprogname",
        "studyprogstudylevel", "studyprogstudylevelcode"
    )
    VALUES ($1, $2, $3, $4, $5, $6)
"#;

const INSERT_COURSE: &str = r#"
    INSERT INTO "course" (
        "courseid", "name", "ownerid", "showtype", "detailtype", "name_en", "name_nn",
        "coursetype", "tpsort", "showdiscipline", "campusid", "yearfrom_und",
        "seasonfrom_und", "yearto_und", "seasonto_und", "yearfrom_ex", "seasonfrom_ex",
        "yearto_ex", "seasonto_ex", "departmentid_secondary", "create_activity_zoom",
        "authorized_netgroups", "tpn_copy_daytime", "nofterms", "terminnr", "fullname",
        "fullname_en", "fullname_nn", "idtermin"
    )
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15,
            $16, $17, $18, $19, $20, $21, $22, $23, $24, $25, $26, $27, $28, $29)
    ON CONFLICT ("courseid") DO NOTHING
"#;

/// Drops and recreates `program`, then inserts `programs`. DDL is
/// transactional in PostgreSQL so a failure leaves the old table intact.
pub async fn replace_programs(conn: &mut PgConnection, programs: &[Program]) -> Result<usize> {
    let mut tx = conn.begin().await?;

    sqlx::query(r#"DROP TABLE IF EXISTS "program""#).execute(&mut *tx).await?;
    sqlx::query(CREATE_PROGRAM).execute(&mut *tx).await?;

    for program in programs {
        sqlx::query(INSERT_PROGRAM)
            .bind(&program.id)
            .bind(&program.title)
            .bind(&program.studyprog_code)
            .bind(&program.studyprog_name)
            .bind(&program.studyprog_study_level)
            .bind(&program.studyprog_study_level_code)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;

    Ok(programs.len())
}

pub async fn load_courses(
    conn: &mut PgConnection,
    courses: &[Course],
    keep_existing: bool,
) -> Result<CourseLoad> {
    let mut tx = conn.begin().await?;

    if !keep_existing {
        sqlx::query(r#"DROP TABLE IF EXISTS "course""#).execute(&mut *tx).await?;
    }
    sqlx::query(CREATE_COURSE).execute(&mut *tx).await?;

    let mut load = CourseLoad::default();
    for course in courses {
        let affected = sqlx::query(INSERT_COURSE)
            .bind(&course.id)
            .bind(&course.name)
            .bind(course.ownerid)
            .bind(course.showtype)
            .bind(&course.detailtype)
            .bind(&course.name_en)
            .bind(&course.name_nn)
            .bind(&course.coursetype)
            .bind(&course.tpsort)
            .bind(course.showdiscipline)
            .bind(&course.campusid)
            .bind(course.yearfrom_und)
            .bind(&course.seasonfrom_und)
            .bind(&course.yearto_und)
            .bind(&course.seasonto_und)
            .bind(course.yearfrom_ex)
            .bind(&course.seasonfrom_ex)
            .bind(&course.yearto_ex)
            .bind(&course.seasonto_ex)
            .bind(course.departmentid_secondary)
            .bind(course.create_activity_zoom)
            .bind(&course.authorized_netgroups)
            .bind(course.tpn_copy_daytime)
            .bind(course.nofterms)
            .bind(course.terminnr)
            .bind(&course.fullname)
            .bind(&course.fullname_en)
            .bind(&course.fullname_nn)
            .bind(&course.idtermin)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if affected > 0 {
            load.inserted += 1;
        } else {
            load.skipped += 1;
        }
    }

    tx.commit().await?;

    Ok(load)
}
