// SQL query builder for the filtered, paginated user listing

use crate::auth::error::AuthError;
use crate::auth::role::Role;
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Query parameters accepted by GET /users/get-all-users
/// All fields are optional to support flexible querying
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct ListUsersParams {
    /// Page number (1-indexed, defaults to 1)
    pub page: Option<u32>,
    /// Items per page (defaults to 10, capped at 100)
    pub limit: Option<u32>,
    /// Sort field: createdAt, updatedAt, email, pseudonyme or role
    pub sort_by: Option<String>,
    /// Sort order: "asc" or "desc"
    pub sort_order: Option<String>,
    /// Role filter, comma-separated list of role strings
    pub role: Option<String>,
    /// Email substring filter (case-insensitive)
    pub email: Option<String>,
    /// Pseudonyme substring filter (case-insensitive)
    pub pseudonyme: Option<String>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_to: Option<DateTime<Utc>>,
    pub updated_from: Option<DateTime<Utc>>,
    pub updated_to: Option<DateTime<Utc>>,
}

/// Sort field options for user listings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    CreatedAt,
    UpdatedAt,
    Email,
    Pseudonyme,
    Role,
}

impl SortField {
    fn column(self) -> &'static str {
        match self {
            SortField::CreatedAt => "created_at",
            SortField::UpdatedAt => "updated_at",
            SortField::Email => "email",
            SortField::Pseudonyme => "pseudonyme",
            SortField::Role => "role",
        }
    }

    fn parse(value: &str) -> Result<Self, AuthError> {
        match value {
            "createdAt" => Ok(SortField::CreatedAt),
            "updatedAt" => Ok(SortField::UpdatedAt),
            "email" => Ok(SortField::Email),
            "pseudonyme" => Ok(SortField::Pseudonyme),
            "role" => Ok(SortField::Role),
            other => Err(AuthError::MissingInfo(format!(
                "unknown sort field '{}'",
                other
            ))),
        }
    }
}

/// Sort order options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Validated and normalized listing parameters
#[derive(Debug)]
pub struct ValidatedListing {
    pub roles: Vec<Role>,
    pub email: Option<String>,
    pub pseudonyme: Option<String>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_to: Option<DateTime<Utc>>,
    pub updated_from: Option<DateTime<Utc>>,
    pub updated_to: Option<DateTime<Utc>>,
    pub sort_field: SortField,
    pub sort_order: SortOrder,
    pub page: u32,
    pub limit: u32,
}

impl ValidatedListing {
    /// Validate and normalize raw query parameters
    ///
    /// `caller_role` gates the role filter: callers below super-admin rank
    /// cannot filter by the super-admin role, matching the silent
    /// role-strip behavior elsewhere in the API.
    pub fn from_params(params: ListUsersParams, caller_role: Role) -> Result<Self, AuthError> {
        let mut roles = Vec::new();
        if let Some(raw) = params.role.as_deref() {
            for piece in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
                let role = Role::parse(piece)?;
                if role == Role::SuperAdmin && caller_role != Role::SuperAdmin {
                    continue;
                }
                if !roles.contains(&role) {
                    roles.push(role);
                }
            }
        }

        let sort_field = match params.sort_by.as_deref() {
            Some(field) => SortField::parse(field)?,
            None => SortField::CreatedAt,
        };

        let sort_order = match params.sort_order.as_deref() {
            Some("asc") | None => SortOrder::Asc,
            Some("desc") => SortOrder::Desc,
            Some(other) => {
                return Err(AuthError::MissingInfo(format!(
                    "unknown sort order '{}'",
                    other
                )))
            }
        };

        let page = params.page.unwrap_or(1).max(1);
        let limit = params.limit.unwrap_or(10).clamp(1, 100);

        Ok(Self {
            roles,
            email: normalize(params.email),
            pseudonyme: normalize(params.pseudonyme),
            created_from: params.created_from,
            created_to: params.created_to,
            updated_from: params.updated_from,
            updated_to: params.updated_to,
            sort_field,
            sort_order,
            page,
            limit,
        })
    }
}

fn normalize(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Builds parameterized SQL for the user listing and its COUNT twin
///
/// Text parameters are accumulated in order; timestamps are passed as
/// RFC 3339 strings and cast in SQL.
pub struct UserQueryBuilder {
    where_clauses: Vec<String>,
    params: Vec<String>,
    order_clause: String,
    limit: u32,
    offset: i64,
}

impl UserQueryBuilder {
    /// Build the filters, sort and pagination from validated parameters
    pub fn from_listing(listing: &ValidatedListing) -> Self {
        let mut builder = Self {
            where_clauses: Vec::new(),
            params: Vec::new(),
            order_clause: String::new(),
            limit: listing.limit,
            // i64 arithmetic: page and limit are caller-supplied and their
            // product can exceed u32
            offset: (i64::from(listing.page) - 1) * i64::from(listing.limit),
        };

        if !listing.roles.is_empty() {
            let mut placeholders = Vec::new();
            for role in &listing.roles {
                builder.params.push(role.as_str().to_string());
                placeholders.push(format!("${}", builder.params.len()));
            }
            builder
                .where_clauses
                .push(format!("role IN ({})", placeholders.join(", ")));
        }

        if let Some(email) = &listing.email {
            builder.params.push(format!("%{}%", email));
            builder
                .where_clauses
                .push(format!("email ILIKE ${}", builder.params.len()));
        }

        if let Some(pseudonyme) = &listing.pseudonyme {
            builder.params.push(format!("%{}%", pseudonyme));
            builder
                .where_clauses
                .push(format!("pseudonyme ILIKE ${}", builder.params.len()));
        }

        builder.add_date_bound("created_at", ">=", listing.created_from);
        builder.add_date_bound("created_at", "<=", listing.created_to);
        builder.add_date_bound("updated_at", ">=", listing.updated_from);
        builder.add_date_bound("updated_at", "<=", listing.updated_to);

        let order = match listing.sort_order {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        };
        builder.order_clause = format!("{} {}", listing.sort_field.column(), order);

        builder
    }

    fn add_date_bound(&mut self, column: &str, op: &str, bound: Option<DateTime<Utc>>) {
        if let Some(ts) = bound {
            self.params.push(ts.to_rfc3339());
            self.where_clauses.push(format!(
                "{} {} ${}::timestamptz",
                column,
                op,
                self.params.len()
            ));
        }
    }

    fn where_sql(&self) -> String {
        if self.where_clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.where_clauses.join(" AND "))
        }
    }

    /// Final SELECT with filters, sorting and pagination
    pub fn build(&self) -> (String, Vec<String>) {
        let query = format!(
            "SELECT id, email, password_hash, pseudonyme, role, created_at, updated_at FROM users{} ORDER BY {} LIMIT {} OFFSET {}",
            self.where_sql(),
            self.order_clause,
            self.limit,
            self.offset
        );
        (query, self.params.clone())
    }

    /// COUNT query over the same filters, for pagination metadata
    pub fn build_count(&self) -> (String, Vec<String>) {
        let query = format!("SELECT COUNT(*) FROM users{}", self.where_sql());
        (query, self.params.clone())
    }
}
