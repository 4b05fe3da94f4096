// roles.rs — Role table and resolver subcommands.

use serde::Serialize;

use club_policy::{resolve_capabilities, Capability, Role};

#[derive(Serialize)]
struct RoleRow {
    role: Role,
    capabilities: &'static [Capability],
}

/// Roles that grant `capability`, in table order.
pub fn roles_granting(capability: Capability) -> Vec<Role> {
    Role::ALL
        .iter()
        .copied()
        .filter(|role| role.grants(capability))
        .collect()
}

pub fn execute_roles(json: bool, capability: Option<&str>) -> anyhow::Result<()> {
    let roles = match capability {
        Some(token) => roles_granting(token.parse::<Capability>()?),
        None => Role::ALL.to_vec(),
    };

    if json {
        let rows: Vec<RoleRow> = roles
            .iter()
            .map(|role| RoleRow {
                role: *role,
                capabilities: role.capabilities(),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    println!("{:<16} CAPABILITIES", "ROLE");
    println!("{}", "-".repeat(80));
    for role in &roles {
        let caps = role.capabilities();
        let listed = if caps.is_empty() {
            "(none at tenant scope)".to_string()
        } else {
            caps.iter()
                .map(Capability::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        };
        println!("{:<16} {}", role.as_str(), listed);
    }
    Ok(())
}

pub fn execute_resolve(roles: &[String]) -> anyhow::Result<()> {
    for name in roles {
        if Role::parse(name).is_none() {
            tracing::warn!("ignoring unknown role '{}'", name);
        }
    }
    let capabilities = resolve_capabilities(roles);
    println!("{}", serde_json::to_string_pretty(&capabilities)?);
    Ok(())
}
