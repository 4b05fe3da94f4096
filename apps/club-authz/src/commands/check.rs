// check.rs — Evaluate one policy decision from the command line.
//
// The session is built from the given roles, exactly as a host would, and
// an allow that carries the audit obligation is written to the configured
// audit sink. A sink that does not outlive the process cannot honor that
// obligation, so such a check fails instead of pretending to audit. Client
// IP and user agent are hashed before they enter the request context.

use clap::Args;

use club_audit::hasher::hash_str;
use club_audit::{record_decision, AuditConfig};
use club_policy::{
    evaluate_policy_with_trace, Capability, OrganizationId, PolicyDecisionRequest,
    PolicyRequestContext, PolicyResource, RequestId, SessionContext,
};

#[derive(Args, Debug, Clone)]
pub struct CheckArgs {
    /// Acting user id.
    #[arg(long)]
    pub user: String,
    /// The actor's organization.
    #[arg(long)]
    pub org: String,
    /// Role held by the actor (repeatable).
    #[arg(long = "role")]
    pub roles: Vec<String>,
    /// Capability token to check (e.g. "reservation.read").
    #[arg(long)]
    pub action: String,
    /// Resource kind (e.g. "reservation").
    #[arg(long)]
    pub resource_type: String,
    /// Resource id.
    #[arg(long)]
    pub resource_id: String,
    /// Organization owning the resource (defaults to --org).
    #[arg(long)]
    pub resource_org: Option<String>,
    /// Route recorded in the request context.
    #[arg(long, default_value = "cli")]
    pub route: String,
    /// Client IP; only its hash is kept.
    #[arg(long)]
    pub ip: Option<String>,
    /// Client user agent; only its hash is kept.
    #[arg(long)]
    pub user_agent: Option<String>,
    /// Print the gate-by-gate trace instead of the bare response.
    #[arg(long)]
    pub trace: bool,
}

/// Build the session and decision request described by `args`.
pub fn build_request(args: &CheckArgs) -> anyhow::Result<(SessionContext, PolicyDecisionRequest)> {
    let action: Capability = args.action.parse()?;
    let session = SessionContext::from_roles(args.user.as_str(), args.org.as_str(), args.roles.clone());

    let resource_org = args.resource_org.as_deref().unwrap_or(&args.org);
    let mut context = PolicyRequestContext::new(args.route.clone(), RequestId::generate());
    if let Some(ip) = &args.ip {
        context = context.with_ip_hash(hash_str(ip));
    }
    if let Some(user_agent) = &args.user_agent {
        context = context.with_user_agent_hash(hash_str(user_agent));
    }

    let request = PolicyDecisionRequest {
        actor: session.actor(),
        action,
        resource: PolicyResource {
            resource_type: args.resource_type.clone(),
            id: args.resource_id.clone(),
            organization_id: OrganizationId::new(resource_org),
        },
        context,
    };
    Ok((session, request))
}

pub fn execute(args: &CheckArgs, config: &AuditConfig) -> anyhow::Result<()> {
    let (session, request) = build_request(args)?;
    let trace = evaluate_policy_with_trace(&request, &session.capabilities);

    if args.trace {
        println!("{}", serde_json::to_string_pretty(&trace)?);
    } else {
        println!("{}", serde_json::to_string_pretty(&trace.response)?);
    }

    if trace.response.requires_audit() {
        if !config.sink.is_persistent() {
            anyhow::bail!(
                "decision requires an audit entry but the configured sink ({:?}) does not persist; \
                 set `[audit] sink = \"jsonl\"` in the config file",
                config.sink
            );
        }
        let writer = config.open_writer()?;
        record_decision(&writer, &request, &trace.response)?;
        tracing::info!(
            request_id = %request.context.request_id,
            sink = ?config.sink,
            "audit entry recorded"
        );
    }

    if !trace.response.is_allowed() {
        anyhow::bail!("access denied ({})", trace.response.reason_code);
    }
    Ok(())
}
