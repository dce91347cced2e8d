use anyhow::Result;
use rusqlite::{Connection, params};

use super::CourseLoad;
use crate::model::{Course, Program};

// Initialize tables
pub fn init(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS Program (
            programId TEXT PRIMARY KEY,
            title TEXT,
            studyprogCode TEXT,
            studyprogName TEXT,
            studyprogStudyLevel TEXT,
            studyprogStudyLevelCode TEXT
        );

        CREATE TABLE IF NOT EXISTS Course (
            courseId TEXT PRIMARY KEY,
            name TEXT,
            ownerid INTEGER,
            showtype BOOLEAN,
            detailtype TEXT,
            name_en TEXT,
            name_nn TEXT,
            coursetype TEXT,
            tpsort TEXT,
            showdiscipline BOOLEAN,
            campusid TEXT,
            -- teaching window
            yearfrom_und INTEGER,
            seasonfrom_und TEXT,
            yearto_und TEXT,
            seasonto_und TEXT,
            -- examination window
            yearfrom_ex INTEGER,
            seasonfrom_ex TEXT,
            yearto_ex TEXT,
            seasonto_ex TEXT,
            departmentid_secondary INTEGER,
            create_activity_zoom BOOLEAN,
            authorized_netgroups TEXT,
            tpn_copy_daytime BOOLEAN,
            nofterms INTEGER,
            terminnr INTEGER,
            fullname TEXT,
            fullname_en TEXT,
            fullname_nn TEXT,
            idtermin TEXT
        );
        ",
    )?;

    Ok(())
}

/// Deletes every program and inserts `programs` in one transaction.
pub fn replace_programs(conn: &mut Connection, programs: &[Program]) -> Result<usize> {
    let tx = conn.transaction()?;

    tx.execute("DELETE FROM Program", [])?;

    for program in programs {
        insert_program(&tx, program)?;
    }

    tx.commit()?;

    Ok(programs.len())
}

pub fn load_courses(conn: &mut Connection, courses: &[Course], keep_existing: bool) -> Result<CourseLoad> {
    let tx = conn.transaction()?;

    if !keep_existing {
        tx.execute("DELETE FROM Course", [])?;
    }

    let mut load = CourseLoad::default();
    for course in courses {
        if insert_course(&tx, course)? {
            load.inserted += 1;
        } else {
            load.skipped += 1;
        }
    }

    tx.commit()?;

    Ok(load)
}

fn insert_program(conn: &Connection, program: &Program) -> Result<()> {
    conn.execute(
        "
        INSERT INTO Program
        (programId, title, studyprogCode, studyprogName, studyprogStudyLevel, studyprogStudyLevelCode)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        ",
        params![
            program.id,
            program.title,
            program.studyprog_code,
            program.studyprog_name,
            program.studyprog_study_level,
            program.studyprog_study_level_code
        ],
    )?;

    Ok(())
}

// Returns true if inserted, false if the course id already existed
fn insert_course(conn: &Connection, course: &Course) -> Result<bool> {
    let affected = conn.execute(
        "
        INSERT INTO Course
        (courseId, name, ownerid, showtype, detailtype, name_en, name_nn, coursetype, tpsort,
         showdiscipline, campusid, yearfrom_und, seasonfrom_und, yearto_und, seasonto_und,
         yearfrom_ex, seasonfrom_ex, yearto_ex, seasonto_ex, departmentid_secondary,
         create_activity_zoom, authorized_netgroups, tpn_copy_daytime, nofterms, terminnr,
         fullname, fullname_en, fullname_nn, idtermin)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15,
                ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26, ?27, ?28, ?29)
        ON CONFLICT (courseId) DO NOTHING
        ",
        params![
            course.id,
            course.name,
            course.ownerid,
            course.showtype,
            course.detailtype,
            course.name_en,
            course.name_nn,
            course.coursetype,
            course.tpsort,
            course.showdiscipline,
            course.campusid,
            course.yearfrom_und,
            course.seasonfrom_und,
            course.yearto_und,
            course.seasonto_und,
            course.yearfrom_ex,
            course.seasonfrom_ex,
            course.yearto_ex,
            course.seasonto_ex,
            course.departmentid_secondary,
            course.create_activity_zoom,
            course.authorized_netgroups,
            course.tpn_copy_daytime,
            course.nofterms,
            course.terminnr,
            course.fullname,
            course.fullname_en,
            course.fullname_nn,
            course.idtermin
        ],
    )?;

    Ok(affected > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ProgramCatalog, fixtures};
    use serde_json::json;

    fn open() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init(&conn).unwrap();
        conn
    }

    fn count(conn: &Connection, table: &str) -> i64 {
        conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))
            .unwrap()
    }

    fn course(id: &str, name: &str) -> Course {
        Course {
            id: id.into(),
            name: Some(name.into()),
            ..Default::default()
        }
    }

    #[test]
    fn single_program_scenario() {
        let mut conn = open();
        let catalog: ProgramCatalog = serde_json::from_value(json!({
            "en": { "docs": [fixtures::program("MSIT", "MSc IT")] },
            "no": { "docs": [] }
        }))
        .unwrap();

        let loaded = replace_programs(&mut conn, &catalog.programs().unwrap()).unwrap();
        assert_eq!(loaded, 1);

        let (id, title): (String, String) = conn
            .query_row("SELECT programId, title FROM Program", [], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })
            .unwrap();
        assert_eq!(id, "MSIT");
        assert_eq!(title, "MSc IT");
    }

    #[test]
    fn program_count_matches_docs_across_buckets() {
        let mut conn = open();
        let catalog: ProgramCatalog = serde_json::from_value(json!({
            "en": { "docs": [
                fixtures::program("MTDT_en", "Computer Science"),
                fixtures::program("MSIT_en", "Information Technology")
            ] },
            "no": { "docs": [
                fixtures::program("MTDT_no", "Datateknologi"),
                fixtures::program("MSIT_no", "Informasjonsteknologi"),
                fixtures::program("BIT_no", "Informatikk")
            ] }
        }))
        .unwrap();

        replace_programs(&mut conn, &catalog.programs().unwrap()).unwrap();
        assert_eq!(count(&conn, "Program"), 5);
    }

    #[test]
    fn program_reload_drops_stale_rows() {
        let mut conn = open();
        let first = ProgramCatalog {
            en: json!({ "docs": [fixtures::program("OLD", "Program")] }),
            no: json!({}),
        };
        let second = ProgramCatalog {
            en: json!({ "docs": [fixtures::program("NEW", "Program")] }),
            no: json!({}),
        };

        replace_programs(&mut conn, &first.programs().unwrap()).unwrap();
        replace_programs(&mut conn, &second.programs().unwrap()).unwrap();

        let id: String = conn
            .query_row("SELECT programId FROM Program", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count(&conn, "Program"), 1);
        assert_eq!(id, "NEW");
    }

    #[test]
    fn failed_program_load_rolls_back() {
        let mut conn = open();
        replace_programs(
            &mut conn,
            &ProgramCatalog {
                en: json!({ "docs": [fixtures::program("KEEP", "Program")] }),
                no: json!({}),
            }
            .programs()
            .unwrap(),
        )
        .unwrap();

        let duplicate = ProgramCatalog {
            en: json!({ "docs": [fixtures::program("DUP", "Program")] }),
            no: json!({ "docs": [fixtures::program("DUP", "Program")] }),
        };
        assert!(replace_programs(&mut conn, &duplicate.programs().unwrap()).is_err());

        let id: String = conn
            .query_row("SELECT programId FROM Program", [], |row| row.get(0))
            .unwrap();
        assert_eq!(id, "KEEP");
    }

    #[test]
    fn duplicate_courses_first_seen_wins() {
        let mut conn = open();
        let courses = vec![
            course("TDT4100", "first"),
            course("TMA4100", "other"),
            course("TDT4100", "second"),
        ];

        let load = load_courses(&mut conn, &courses, false).unwrap();
        assert_eq!(load, CourseLoad { inserted: 2, skipped: 1 });
        assert_eq!(count(&conn, "Course"), 2);

        let name: String = conn
            .query_row("SELECT name FROM Course WHERE courseId = 'TDT4100'", [], |row| row.get(0))
            .unwrap();
        assert_eq!(name, "first");
    }

    #[test]
    fn course_reload_truncates_by_default() {
        let mut conn = open();
        load_courses(&mut conn, &[course("OLD", "old")], false).unwrap();
        load_courses(&mut conn, &[course("NEW", "new")], false).unwrap();

        let id: String = conn
            .query_row("SELECT courseId FROM Course", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count(&conn, "Course"), 1);
        assert_eq!(id, "NEW");
    }

    #[test]
    fn keep_existing_never_overwrites() {
        let mut conn = open();
        load_courses(&mut conn, &[course("TDT4100", "original")], false).unwrap();

        let load = load_courses(
            &mut conn,
            &[course("TDT4100", "changed"), course("TMA4100", "added")],
            true,
        )
        .unwrap();
        assert_eq!(load, CourseLoad { inserted: 1, skipped: 1 });

        let name: String = conn
            .query_row("SELECT name FROM Course WHERE courseId = 'TDT4100'", [], |row| row.get(0))
            .unwrap();
        assert_eq!(name, "original");
        assert_eq!(count(&conn, "Course"), 2);
    }

    #[test]
    fn course_columns_are_typed() {
        let mut conn = open();
        let course = Course {
            id: "TDT4100".into(),
            ownerid: Some(194),
            showtype: Some(true),
            yearfrom_und: Some(2024),
            seasonfrom_und: Some("h".into()),
            tpn_copy_daytime: Some(false),
            ..Default::default()
        };

        load_courses(&mut conn, &[course], false).unwrap();

        let (ownerid, showtype, year, season, copy, name): (
            i32,
            bool,
            i32,
            String,
            bool,
            Option<String>,
        ) = conn
            .query_row(
                "SELECT ownerid, showtype, yearfrom_und, seasonfrom_und, tpn_copy_daytime, name FROM Course",
                [],
                |row| {
                    Ok((
                        row.get(0)?,
                        row.get(1)?,
                        row.get(2)?,
                        row.get(3)?,
                        row.get(4)?,
                        row.get(5)?,
                    ))
                },
            )
            .unwrap();
        assert_eq!((ownerid, showtype, year), (194, true, 2024));
        assert_eq!(season, "h");
        assert!(!copy);
        assert_eq!(name, None);
    }

    #[test]
    fn blank_course_text_is_stored_verbatim() {
        let mut conn = open();
        let courses = crate::model::courses_from_values(&[fixtures::course(
            "TDT4100",
            "Objektorientert programmering",
        )])
        .unwrap();

        load_courses(&mut conn, &courses, false).unwrap();

        let (name_nn, fullname_en): (Option<String>, Option<String>) = conn
            .query_row("SELECT name_nn, fullname_en FROM Course", [], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })
            .unwrap();
        assert_eq!(name_nn.as_deref(), Some(""));
        assert_eq!(fullname_en, None);
    }
}
