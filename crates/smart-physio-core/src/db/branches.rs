//! Branch, user and role-profile database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{audit_from_row, Database, DbResult, AUDIT_COLUMNS};
use crate::models::{Branch, BranchAdmin, StaffProfile, User};

fn branch_from_row(row: &Row<'_>) -> rusqlite::Result<Branch> {
    Ok(Branch {
        id: row.get(0)?,
        name: row.get(1)?,
        address: row.get(2)?,
        phone_number: row.get(3)?,
        email: row.get(4)?,
        is_active: row.get(5)?,
        audit: audit_from_row(row, 6)?,
    })
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        full_name: row.get(2)?,
        is_superuser: row.get(3)?,
        created_at: row.get(4)?,
    })
}

impl Database {
    // =========================================================================
    // Users
    // =========================================================================

    /// Insert a new user.
    pub fn insert_user(&self, user: &User) -> DbResult<()> {
        self.conn.execute(
            "INSERT INTO users (id, username, full_name, is_superuser, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                user.id,
                user.username,
                user.full_name,
                user.is_superuser,
                user.created_at,
            ],
        )?;
        Ok(())
    }

    /// Get a user by ID.
    pub fn get_user(&self, id: &str) -> DbResult<Option<User>> {
        self.conn
            .query_row(
                "SELECT id, username, full_name, is_superuser, created_at FROM users WHERE id = ?",
                [id],
                user_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    // =========================================================================
    // Branches
    // =========================================================================

    /// Insert a new branch.
    pub fn insert_branch(&self, branch: &Branch) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO branches (
                id, name, address, phone_number, email, is_active,
                created_at, updated_at, created_by, updated_by
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                branch.id,
                branch.name,
                branch.address,
                branch.phone_number,
                branch.email,
                branch.is_active,
                branch.audit.created_at,
                branch.audit.updated_at,
                branch.audit.created_by,
                branch.audit.updated_by,
            ],
        )?;
        Ok(())
    }

    /// Get a branch by ID.
    pub fn get_branch(&self, id: &str) -> DbResult<Option<Branch>> {
        self.conn
            .query_row(
                &format!(
                    "SELECT id, name, address, phone_number, email, is_active, {} FROM branches WHERE id = ?",
                    AUDIT_COLUMNS
                ),
                [id],
                branch_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// List all branches by name.
    pub fn list_branches(&self) -> DbResult<Vec<Branch>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT id, name, address, phone_number, email, is_active, {} FROM branches ORDER BY name",
            AUDIT_COLUMNS
        ))?;
        let rows = stmt.query_map([], branch_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    // =========================================================================
    // Role profiles
    // =========================================================================

    /// Attach a user as administrator of a branch.
    pub fn insert_branch_admin(&self, admin: &BranchAdmin) -> DbResult<()> {
        self.conn.execute(
            "INSERT INTO branch_admins (user_id, branch_id, phone_number) VALUES (?1, ?2, ?3)",
            params![admin.user_id, admin.branch_id, admin.phone_number],
        )?;
        Ok(())
    }

    /// Get the branch-admin profile of a user, if any.
    pub fn get_branch_admin(&self, user_id: &str) -> DbResult<Option<BranchAdmin>> {
        self.conn
            .query_row(
                "SELECT user_id, branch_id, phone_number FROM branch_admins WHERE user_id = ?",
                [user_id],
                |row| {
                    Ok(BranchAdmin {
                        user_id: row.get(0)?,
                        branch_id: row.get(1)?,
                        phone_number: row.get(2)?,
                    })
                },
            )
            .optional()
            .map_err(Into::into)
    }

    /// Attach a user as staff.
    pub fn insert_staff_profile(&self, staff: &StaffProfile) -> DbResult<()> {
        self.conn.execute(
            "INSERT INTO staff_profiles (user_id, branch_id, position, joining_date, is_active) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                staff.user_id,
                staff.branch_id,
                staff.position,
                staff.joining_date,
                staff.is_active,
            ],
        )?;
        Ok(())
    }

    /// Get the staff profile of a user, if any.
    pub fn get_staff_profile(&self, user_id: &str) -> DbResult<Option<StaffProfile>> {
        self.conn
            .query_row(
                "SELECT user_id, branch_id, position, joining_date, is_active FROM staff_profiles WHERE user_id = ?",
                [user_id],
                |row| {
                    Ok(StaffProfile {
                        user_id: row.get(0)?,
                        branch_id: row.get(1)?,
                        position: row.get(2)?,
                        joining_date: row.get(3)?,
                        is_active: row.get(4)?,
                    })
                },
            )
            .optional()
            .map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AuditContext;

    #[test]
    fn test_insert_and_get_branch() {
        let db = Database::open_in_memory().unwrap();
        let ctx = AuditContext::system();

        let mut branch = Branch::new("Central".into(), "1 Main St".into(), &ctx);
        branch.email = "central@clinic.test".into();
        db.insert_branch(&branch).unwrap();

        let retrieved = db.get_branch(&branch.id).unwrap().unwrap();
        assert_eq!(retrieved, branch);

        let annex = Branch::new("Annex".into(), "3 Side St".into(), &ctx);
        db.insert_branch(&annex).unwrap();
        let names: Vec<_> = db.list_branches().unwrap().into_iter().map(|b| b.name).collect();
        assert_eq!(names, vec!["Annex", "Central"]);
    }

    #[test]
    fn test_branch_name_unique() {
        let db = Database::open_in_memory().unwrap();
        let ctx = AuditContext::system();

        db.insert_branch(&Branch::new("Central".into(), "A".into(), &ctx))
            .unwrap();
        let err = db
            .insert_branch(&Branch::new("Central".into(), "B".into(), &ctx))
            .unwrap_err();
        assert!(err.is_constraint_violation());
    }

    #[test]
    fn test_role_profiles() {
        let db = Database::open_in_memory().unwrap();
        let branch = Branch::new("North".into(), "2 High St".into(), &AuditContext::system());
        db.insert_branch(&branch).unwrap();

        let user = User::new("admin".into(), "Admin".into());
        db.insert_user(&user).unwrap();
        db.insert_branch_admin(&BranchAdmin {
            user_id: user.id.clone(),
            branch_id: branch.id.clone(),
            phone_number: "555-0100".into(),
        })
        .unwrap();

        let admin = db.get_branch_admin(&user.id).unwrap().unwrap();
        assert_eq!(admin.branch_id, branch.id);
        assert!(db.get_staff_profile(&user.id).unwrap().is_none());
        assert_eq!(db.get_user(&user.id).unwrap().unwrap().username, "admin");
    }
}
