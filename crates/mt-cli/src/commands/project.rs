//! Project commands.

use std::io::Write;

use anyhow::{Result, bail};
use mt_db::Database;

pub fn add<W: Write>(writer: &mut W, db: &Database, name: &str) -> Result<()> {
    let name = name.trim();
    if name.is_empty() {
        bail!("project name cannot be empty");
    }
    if db.list_projects()?.iter().any(|p| p.name == name) {
        bail!("project already exists: {name}");
    }

    let project = db.create_project(name)?;
    writeln!(writer, "Created project {} ({})", project.name, project.id)?;
    Ok(())
}

pub fn list<W: Write>(writer: &mut W, db: &Database) -> Result<()> {
    let projects = db.list_projects()?;
    if projects.is_empty() {
        writeln!(writer, "No projects.")?;
        return Ok(());
    }
    for project in projects {
        writeln!(writer, "{}  {}", project.id, project.name)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_creates_project() {
        let db = Database::open_in_memory().unwrap();
        let mut output = Vec::new();
        add(&mut output, &db, " Life ").unwrap();

        let projects = db.list_projects().unwrap();
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].name, "Life");
        assert_eq!(
            String::from_utf8(output).unwrap(),
            format!("Created project Life ({})\n", projects[0].id)
        );
    }

    #[test]
    fn add_refuses_duplicates_and_blanks() {
        let db = Database::open_in_memory().unwrap();
        let mut output = Vec::new();
        add(&mut output, &db, "Life").unwrap();

        let err = add(&mut output, &db, "Life").unwrap_err();
        assert_eq!(err.to_string(), "project already exists: Life");
        assert!(add(&mut output, &db, "   ").is_err());
        assert_eq!(db.list_projects().unwrap().len(), 1);
    }

    #[test]
    fn list_empty() {
        let db = Database::open_in_memory().unwrap();
        let mut output = Vec::new();
        list(&mut output, &db).unwrap();
        assert_eq!(String::from_utf8(output).unwrap(), "No projects.\n");
    }
}
