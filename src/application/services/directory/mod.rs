use std::collections::HashSet;

use ldap3::ldap_escape;
use tracing::{debug, info, warn};

use crate::application::ports::directory_port::{DirectoryError, DirectorySession};
use crate::domain::directory::entry::{DirectoryEntry, DirectoryUser};
use crate::domain::directory::schema::DirectorySchema;

pub fn to_user(schema: &DirectorySchema, entry: &DirectoryEntry) -> DirectoryUser {
    let a = &schema.attributes;
    DirectoryUser {
        dn: entry.dn.clone(),
        user_id: entry.first(&a.user_rdn),
        common_name: entry.first(&a.display_name),
        first_name: entry.first(&a.first_name),
        last_name: entry.first(&a.last_name),
        email: entry.first(&a.email),
    }
}

/// All person entries below the base DN.
pub async fn list_users<S>(
    session: &mut S,
    schema: &DirectorySchema,
) -> Result<Vec<DirectoryUser>, DirectoryError>
where
    S: DirectorySession + ?Sized,
{
    let filter = schema.effective_user_filter();
    debug!(%filter, base_dn = %schema.base_dn, "directory_user_search");
    let entries = session
        .search(&schema.base_dn, filter, &schema.user_attributes())
        .await?;
    info!(count = entries.len(), "directory_user_search_done");
    if entries.is_empty() {
        return Err(DirectoryError::NotFound {
            filter: filter.to_string(),
        });
    }
    Ok(entries.iter().map(|e| to_user(schema, e)).collect())
}

/// Members of every group matched by the group filter, resolved to person
/// entries through their leading RDN.
pub async fn list_group_members<S>(
    session: &mut S,
    schema: &DirectorySchema,
) -> Result<Vec<DirectoryUser>, DirectoryError>
where
    S: DirectorySession + ?Sized,
{
    let filter = schema.group_filter.trim();
    debug!(%filter, base_dn = %schema.base_dn, "directory_group_search");
    let groups = session
        .search(&schema.base_dn, filter, &schema.group_attributes())
        .await?;
    if groups.is_empty() {
        return Err(DirectoryError::NotFound {
            filter: filter.to_string(),
        });
    }

    let user_attrs = schema.user_attributes();
    let mut seen = HashSet::new();
    let mut members = Vec::new();
    for group in &groups {
        let raw_members = group.values(&schema.attributes.group_member);
        info!(group = %group.dn, count = raw_members.len(), "directory_group_members");
        for member_dn in raw_members {
            let Some(member_filter) = leading_rdn_filter(member_dn) else {
                warn!(dn = %member_dn, "directory_member_dn_unparseable");
                continue;
            };
            let found = session
                .search(&schema.base_dn, &member_filter, &user_attrs)
                .await?;
            if found.is_empty() {
                warn!(filter = %member_filter, "directory_member_lookup_empty");
                continue;
            }
            for entry in &found {
                if seen.insert(entry.dn.to_ascii_lowercase()) {
                    members.push(to_user(schema, entry));
                }
            }
        }
    }
    if members.is_empty() {
        return Err(DirectoryError::NotFound {
            filter: format!("{} members", filter),
        });
    }
    Ok(members)
}

/// Step one of authentication: map a user identifier to exactly one DN while
/// bound as the service identity.
pub async fn resolve_user<S>(
    session: &mut S,
    schema: &DirectorySchema,
    username: &str,
) -> Result<DirectoryUser, DirectoryError>
where
    S: DirectorySession + ?Sized,
{
    let filter = user_lookup_filter(schema, username);
    debug!(%filter, "directory_user_lookup");
    let entries = session
        .search(&schema.base_dn, &filter, &schema.user_attributes())
        .await?;
    match entries.as_slice() {
        [] => Err(DirectoryError::NotFound { filter }),
        [entry] => Ok(to_user(schema, entry)),
        many => Err(DirectoryError::Ambiguous {
            filter,
            count: many.len(),
        }),
    }
}

/// Resolves the user and then binds as them. The second bind is the only
/// authentication signal.
pub async fn authenticate<S>(
    session: &mut S,
    schema: &DirectorySchema,
    username: &str,
    password: &str,
) -> Result<DirectoryUser, DirectoryError>
where
    S: DirectorySession + ?Sized,
{
    // An empty simple bind is an anonymous bind and succeeds on most servers.
    if password.is_empty() {
        return Err(DirectoryError::InvalidCredentials(None));
    }
    let user = resolve_user(session, schema, username).await?;
    match session.bind(&user.dn, password).await {
        Ok(()) => {
            info!(user = %user.user_id, "directory_authenticated");
            Ok(user)
        }
        Err(DirectoryError::Bind { source, .. }) => {
            Err(DirectoryError::InvalidCredentials(Some(source)))
        }
        Err(e) => Err(e),
    }
}

pub fn user_lookup_filter(schema: &DirectorySchema, username: &str) -> String {
    let by_id = format!(
        "({}={})",
        schema.attributes.user_rdn,
        ldap_escape(username.trim())
    );
    let user_filter = schema.user_filter.trim();
    if user_filter.is_empty() {
        by_id
    } else {
        format!("(&{}{})", user_filter, by_id)
    }
}

/// Builds `(attr=value)` from the first RDN of `dn`, e.g.
/// `cn=Hubert J. Farnsworth,ou=people,dc=planetexpress,dc=com` gives
/// `(cn=Hubert J. Farnsworth)`.
pub fn leading_rdn_filter(dn: &str) -> Option<String> {
    let mut rdn = String::new();
    let mut chars = dn.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                rdn.push(c);
                if let Some(next) = chars.next() {
                    rdn.push(next);
                }
            }
            ',' => break,
            _ => rdn.push(c),
        }
    }
    let (attr, value) = rdn.split_once('=')?;
    let attr = attr.trim();
    if attr.is_empty() {
        return None;
    }
    Some(format!(
        "({}={})",
        attr,
        ldap_escape(&unescape_dn_value(value.trim()))
    ))
}

/// Reverses RFC 4514 value escaping: `\,` style pairs and `\2C` style hex
/// pairs, which may spell out multi-byte UTF-8.
fn unescape_dn_value(value: &str) -> String {
    let mut out = Vec::with_capacity(value.len());
    let mut rest = value.as_bytes();
    while let Some((&b, tail)) = rest.split_first() {
        rest = tail;
        if b != b'\\' {
            out.push(b);
            continue;
        }
        match rest {
            [hi, lo, tail @ ..] if hi.is_ascii_hexdigit() && lo.is_ascii_hexdigit() => {
                out.push((hex_digit(*hi) << 4) | hex_digit(*lo));
                rest = tail;
            }
            [next, tail @ ..] => {
                out.push(*next);
                rest = tail;
            }
            [] => {}
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_digit(b: u8) -> u8 {
    match b {
        b'0'..=b'9' => b - b'0',
        b'a'..=b'f' => b - b'a' + 10,
        _ => b - b'A' + 10,
    }
}
