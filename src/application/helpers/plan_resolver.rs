use std::collections::HashMap;

/// Maps processor-side price/product identifiers to internal plan ids.
///
/// The table is deployment configuration and never changes at runtime.
#[derive(Debug, Clone, Default)]
pub struct PlanResolver {
    price_to_plan: HashMap<String, String>,
}

impl PlanResolver {
    pub fn new(price_to_plan: HashMap<String, String>) -> Self {
        Self { price_to_plan }
    }

    /// Resolve the internal plan id for a subscription.
    ///
    /// Candidates are tried in order against the table. If none is mapped, the
    /// metadata plan id is used when present and non-empty. Returns `None` when
    /// neither source yields a plan; callers must abort rather than guess.
    pub fn resolve(&self, candidates: &[&str], metadata_plan_id: Option<&str>) -> Option<String> {
        candidates
            .iter()
            .find_map(|id| self.price_to_plan.get(*id))
            .cloned()
            .or_else(|| {
                metadata_plan_id
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
            })
    }
}
