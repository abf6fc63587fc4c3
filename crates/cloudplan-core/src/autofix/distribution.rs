use super::PlanFixer;
use crate::types::{placeholder, Command, Plan};

const DEFAULT_ID_KEY: &str = "DISTRIBUTION_ID";
const DEFAULT_DOMAIN_KEY: &str = "DISTRIBUTION_DOMAIN";
const DEFAULT_URL_KEY: &str = "DISTRIBUTION_URL";

/// Content-delivery distribution lifecycle.
///
/// A created distribution must publish its identifier, domain and secure URL,
/// and must be followed by a wait until it is deployed.
#[derive(Debug, Clone)]
pub struct DistributionFixer {
    service: String,
    create_operation: String,
    wait_condition: String,
    id_expression: String,
    domain_expression: String,
}

impl DistributionFixer {
    pub const NAME: &'static str = "distribution_lifecycle";

    fn create_index(&self, plan: &Plan) -> Option<usize> {
        plan.commands
            .iter()
            .rposition(|cmd| cmd.is_shape(&self.service, &self.create_operation))
    }

    fn has_wait_after(&self, plan: &Plan, after: usize, id_key: &str) -> bool {
        plan.commands.iter().skip(after + 1).any(|cmd| {
            cmd.is_shape(&self.service, "wait")
                && cmd.args.iter().any(|arg| arg == &self.wait_condition)
                && cmd.references(id_key)
        })
    }

    fn wait_command(&self, id_key: &str) -> Command {
        let id = placeholder(id_key);
        Command::new([
            self.service.as_str(),
            "wait",
            self.wait_condition.as_str(),
            "--id",
            id.as_str(),
        ])
        .with_reason("Wait for the distribution to finish deploying")
    }
}

impl Default for DistributionFixer {
    fn default() -> Self {
        Self {
            service: "cloudfront".to_string(),
            create_operation: "create-distribution".to_string(),
            wait_condition: "distribution-deployed".to_string(),
            id_expression: "$.Distribution.Id".to_string(),
            domain_expression: "$.Distribution.DomainName".to_string(),
        }
    }
}

fn is_distribution_key(key: &str, suffix: &str) -> bool {
    key.contains("DISTRIBUTION") && key.ends_with(suffix)
}

/// First key any command declares that matches `suffix`.
fn declared_key(plan: &Plan, suffix: &str) -> Option<String> {
    plan.commands
        .iter()
        .flat_map(|cmd| cmd.produces.keys())
        .find(|key| is_distribution_key(key, suffix))
        .cloned()
}

impl PlanFixer for DistributionFixer {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn fix(&self, plan: &mut Plan) -> usize {
        let Some(create_idx) = self.create_index(plan) else {
            return 0;
        };
        let mut repairs = 0;

        let id_key = declared_key(plan, "_ID");
        let domain_key = declared_key(plan, "_DOMAIN");
        let url_key = declared_key(plan, "_URL");

        let create = &mut plan.commands[create_idx];
        let id_key = id_key.unwrap_or_else(|| {
            create
                .produces
                .insert(DEFAULT_ID_KEY.to_string(), self.id_expression.clone());
            repairs += 1;
            DEFAULT_ID_KEY.to_string()
        });
        let domain_key = domain_key.unwrap_or_else(|| {
            create
                .produces
                .insert(DEFAULT_DOMAIN_KEY.to_string(), self.domain_expression.clone());
            repairs += 1;
            DEFAULT_DOMAIN_KEY.to_string()
        });
        if url_key.is_none() {
            create.produces.insert(
                DEFAULT_URL_KEY.to_string(),
                format!("https://{}", placeholder(&domain_key)),
            );
            repairs += 1;
        }

        if !self.has_wait_after(plan, create_idx, &id_key) {
            plan.commands.push(self.wait_command(&id_key));
            repairs += 1;
        }

        if repairs > 0 {
            tracing::debug!(
                fixer = Self::NAME,
                repairs,
                id_key = %id_key,
                "filled distribution lifecycle gaps"
            );
        }
        repairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dedup::{DedupPass, OrphanPass};

    fn create() -> Command {
        Command::new([
            "cloudfront",
            "create-distribution",
            "--origin-domain-name",
            "bucket.s3.amazonaws.com",
        ])
    }

    #[test]
    fn test_bare_create_gets_produces_and_trailing_wait() {
        let mut plan = Plan::new(vec![create()]);
        let repairs = DistributionFixer::default().fix(&mut plan);

        assert_eq!(repairs, 4);
        assert_eq!(plan.len(), 2);
        let produces = &plan.commands[0].produces;
        assert_eq!(produces.len(), 3);
        assert_eq!(produces["DISTRIBUTION_ID"], "$.Distribution.Id");
        assert_eq!(produces["DISTRIBUTION_DOMAIN"], "$.Distribution.DomainName");
        assert_eq!(produces["DISTRIBUTION_URL"], "https://<DISTRIBUTION_DOMAIN>");
        let wait = &plan.commands[1];
        assert!(wait.is_shape("cloudfront", "wait"));
        assert!(wait.references("DISTRIBUTION_ID"));
        // the repaired plan has no orphans
        assert_eq!(OrphanPass.apply(&plan).removed, 0);
    }

    #[test]
    fn test_existing_mappings_and_wait_are_respected() {
        let mut plan = Plan::new(vec![
            create()
                .with_produces("CF_DISTRIBUTION_ID", "Id")
                .with_produces("CF_DISTRIBUTION_DOMAIN", "DomainName"),
            Command::new([
                "cloudfront",
                "wait",
                "distribution-deployed",
                "--id",
                "<CF_DISTRIBUTION_ID>",
            ]),
        ]);
        let repairs = DistributionFixer::default().fix(&mut plan);
        assert_eq!(repairs, 1);
        let produces = &plan.commands[0].produces;
        assert_eq!(produces["CF_DISTRIBUTION_ID"], "Id");
        assert_eq!(produces["DISTRIBUTION_URL"], "https://<CF_DISTRIBUTION_DOMAIN>");
        assert_eq!(plan.len(), 2);
    }

    #[test]
    fn test_fix_is_stable_and_ignores_unrelated_plans() {
        let fixer = DistributionFixer::default();
        let mut plan = Plan::new(vec![create()]);
        fixer.fix(&mut plan);
        let snapshot = plan.clone();
        assert_eq!(fixer.fix(&mut plan), 0);
        assert_eq!(plan, snapshot);

        let mut unrelated = Plan::new(vec![Command::new(["s3", "ls"])]);
        assert_eq!(fixer.fix(&mut unrelated), 0);
    }
}
