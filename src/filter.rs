use crate::cluster::ClusterRecord;
use crate::config::ProcessingConfiguration;
use rustc_hash::FxHashSet;
use std::borrow::Cow;
use tracing::debug;

/// Filtering mode compiled from a [`ProcessingConfiguration`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterMode<'a> {
    /// Pass through all clusters (no filtering)
    Passthrough,
    /// Include only clusters in the allowlist
    Allow(FxHashSet<&'a str>),
    /// Exclude clusters in the blocklist
    Block(FxHashSet<&'a str>),
}

/// Cluster filter with membership sets built once.
///
/// When both modes are enabled the blocklist is subtracted from the
/// allowlist up front, so a cluster survives exactly when it is allowed and
/// not blocked, and the hot loop only ever consults one set.
#[derive(Debug, Clone)]
pub struct ClusterFilter<'a> {
    mode: FilterMode<'a>,
}

impl<'a> ClusterFilter<'a> {
    pub fn new(config: &'a ProcessingConfiguration) -> Self {
        let mode = match (config.filter_allowed_clusters, config.filter_blocked_clusters) {
            (false, false) => FilterMode::Passthrough,
            (true, false) => FilterMode::Allow(name_set(&config.allowed_clusters)),
            (false, true) => FilterMode::Block(name_set(&config.blocked_clusters)),
            (true, true) => {
                let mut allow = name_set(&config.allowed_clusters);
                let block = name_set(&config.blocked_clusters);
                let original_count = allow.len();
                allow.retain(|name| !block.contains(name));
                debug!(
                    allowed = original_count,
                    blocked = block.len(),
                    remaining = allow.len(),
                    "removed blocked clusters from allowlist"
                );
                FilterMode::Allow(allow)
            }
        };

        match &mode {
            FilterMode::Passthrough => debug!("cluster filtering disabled"),
            FilterMode::Allow(set) => debug!(clusters = set.len(), "allowlist filtering enabled"),
            FilterMode::Block(set) => debug!(clusters = set.len(), "blocklist filtering enabled"),
        }

        Self { mode }
    }

    pub fn mode(&self) -> &FilterMode<'a> {
        &self.mode
    }

    /// Does a cluster with this name survive the filter?
    #[inline]
    pub fn accepts(&self, cluster_name: &str) -> bool {
        match &self.mode {
            FilterMode::Passthrough => true,
            FilterMode::Allow(allowlist) => allowlist.contains(cluster_name),
            FilterMode::Block(blocklist) => !blocklist.contains(cluster_name),
        }
    }

    /// Filter `clusters`, returning the survivors in input order and the
    /// number of clusters removed.
    ///
    /// The input is borrowed back untouched whenever nothing is removed.
    pub fn apply<'c, T>(&self, clusters: &'c [T]) -> (Cow<'c, [T]>, usize)
    where
        T: ClusterRecord + Clone,
    {
        // Branch on mode outside the per-cluster loop
        let filtered = match &self.mode {
            FilterMode::Passthrough => Cow::Borrowed(clusters),
            FilterMode::Allow(allowlist) => process_filtered(clusters, allowlist, true),
            FilterMode::Block(blocklist) => process_filtered(clusters, blocklist, false),
        };
        let removed = clusters.len() - filtered.len();

        debug!(
            total = clusters.len(),
            kept = filtered.len(),
            removed,
            "filtered cluster list"
        );

        (filtered, removed)
    }
}

/// Filter a cluster list against the allow/block lists of `config`.
///
/// Returns the surviving clusters in their original order together with
/// the number of clusters removed. With both modes disabled the input is
/// handed back as is, before any lookup set is built.
pub fn filter_cluster_list<'c, T>(
    clusters: &'c [T],
    config: &ProcessingConfiguration,
) -> (Cow<'c, [T]>, usize)
where
    T: ClusterRecord + Clone,
{
    if !config.is_filtering() {
        return (Cow::Borrowed(clusters), 0);
    }

    ClusterFilter::new(config).apply(clusters)
}

fn name_set(names: &[String]) -> FxHashSet<&str> {
    names.iter().map(String::as_str).collect()
}

/// Process clusters with filtering based on list membership
///
/// When `include_on_match` is true (Allow mode): keeps clusters where list.contains(name) == true
/// When `include_on_match` is false (Block mode): keeps clusters where list.contains(name) == false
fn process_filtered<'c, T>(
    clusters: &'c [T],
    list: &FxHashSet<&str>,
    include_on_match: bool,
) -> Cow<'c, [T]>
where
    T: ClusterRecord + Clone,
{
    let keep = |cluster: &T| list.contains(cluster.cluster_name()) == include_on_match;

    // Nothing to copy until the first cluster is dropped
    let Some(first_dropped) = clusters.iter().position(|c| !keep(c)) else {
        return Cow::Borrowed(clusters);
    };

    let mut survivors = Vec::with_capacity(clusters.len() - 1);
    survivors.extend_from_slice(&clusters[..first_dropped]);
    survivors.extend(
        clusters[first_dropped + 1..]
            .iter()
            .filter(|c| keep(*c))
            .cloned(),
    );

    Cow::Owned(survivors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[derive(Debug, Clone, PartialEq)]
    struct Named(&'static str);

    impl ClusterRecord for Named {
        fn cluster_name(&self) -> &str {
            self.0
        }
    }

    fn clusters() -> Vec<Named> {
        vec![Named("1"), Named("2"), Named("3"), Named("4"), Named("5")]
    }

    fn config(allow: Option<&[&str]>, block: Option<&[&str]>) -> ProcessingConfiguration {
        let to_vec = |names: &[&str]| names.iter().map(|s| s.to_string()).collect();
        ProcessingConfiguration {
            filter_allowed_clusters: allow.is_some(),
            filter_blocked_clusters: block.is_some(),
            allowed_clusters: allow.map(to_vec).unwrap_or_default(),
            blocked_clusters: block.map(to_vec).unwrap_or_default(),
        }
    }

    #[test]
    fn test_passthrough_borrows_input() {
        let input = clusters();
        let (result, removed) = filter_cluster_list(&input, &ProcessingConfiguration::default());

        assert!(matches!(result, Cow::Borrowed(_)));
        assert_eq!(&*result, &input[..]);
        assert_eq!(removed, 0);
    }

    #[test]
    fn test_passthrough_ignores_lists() {
        let mut cfg = config(None, None);
        cfg.allowed_clusters = vec!["1".into()];
        cfg.blocked_clusters = vec!["2".into()];

        let input = clusters();
        let (result, removed) = filter_cluster_list(&input, &cfg);
        assert_eq!(result.len(), 5);
        assert_eq!(removed, 0);
    }

    #[test]
    fn test_allow_mode() {
        let input = clusters();
        let (result, removed) = filter_cluster_list(&input, &config(Some(&["2"]), None));

        assert_eq!(&*result, &[Named("2")]);
        assert_eq!(removed, 4);
    }

    #[test]
    fn test_block_mode() {
        let input = clusters();
        let (result, removed) = filter_cluster_list(&input, &config(None, Some(&["2"])));

        assert_eq!(&*result, &[Named("1"), Named("3"), Named("4"), Named("5")]);
        assert_eq!(removed, 1);
    }

    #[test]
    fn test_both_modes_are_conjunctive() {
        let input = clusters();
        let cfg = config(Some(&["2", "3"]), Some(&["3"]));
        let (result, removed) = filter_cluster_list(&input, &cfg);

        assert_eq!(&*result, &[Named("2")]);
        assert_eq!(removed, 4);
    }

    #[test]
    fn test_both_modes_compile_to_allow_minus_block() {
        let cfg = config(Some(&["2", "3"]), Some(&["3", "9"]));
        let filter = ClusterFilter::new(&cfg);

        let expected: FxHashSet<&str> = ["2"].into_iter().collect();
        assert_eq!(filter.mode(), &FilterMode::Allow(expected));
    }

    #[test]
    fn test_empty_allowlist_rejects_everything() {
        let input = clusters();
        let (result, removed) = filter_cluster_list(&input, &config(Some(&[]), None));

        assert!(result.is_empty());
        assert_eq!(removed, 5);
    }

    #[test]
    fn test_empty_blocklist_keeps_everything_borrowed() {
        let input = clusters();
        let (result, removed) = filter_cluster_list(&input, &config(None, Some(&[])));

        assert!(matches!(result, Cow::Borrowed(_)));
        assert_eq!(result.len(), 5);
        assert_eq!(removed, 0);
    }

    #[test]
    fn test_empty_input() {
        let input: Vec<Named> = Vec::new();
        for cfg in [
            config(None, None),
            config(Some(&[]), None),
            config(None, Some(&[])),
            config(Some(&["1"]), Some(&["2"])),
        ] {
            let (result, removed) = filter_cluster_list(&input, &cfg);
            assert!(result.is_empty());
            assert_eq!(removed, 0);
        }
    }

    #[test]
    fn test_duplicates_and_order_preserved() {
        let input = vec![Named("3"), Named("1"), Named("3"), Named("2"), Named("1")];
        let (result, removed) = filter_cluster_list(&input, &config(Some(&["1", "3"]), None));

        assert_eq!(&*result, &[Named("3"), Named("1"), Named("3"), Named("1")]);
        assert_eq!(removed, 1);
    }

    #[test]
    fn test_first_cluster_dropped() {
        let input = clusters();
        let (result, removed) = filter_cluster_list(&input, &config(None, Some(&["1"])));

        assert_eq!(&*result, &[Named("2"), Named("3"), Named("4"), Named("5")]);
        assert_eq!(removed, 1);
    }

    #[test]
    fn test_names_match_exactly() {
        let input = vec![Named("c1"), Named("C1"), Named(" c1")];
        let (result, _) = filter_cluster_list(&input, &config(Some(&["c1"]), None));

        assert_eq!(&*result, &[Named("c1")]);
    }

    #[test]
    fn test_accepts() {
        let cfg = config(Some(&["1", "2"]), Some(&["2"]));
        let filter = ClusterFilter::new(&cfg);

        assert!(filter.accepts("1"));
        assert!(!filter.accepts("2"));
        assert!(!filter.accepts("3"));
    }

    #[test]
    fn test_filter_reused_across_batches() {
        let cfg = config(None, Some(&["2"]));
        let filter = ClusterFilter::new(&cfg);

        let first = clusters();
        let second = vec![Named("2"), Named("2"), Named("7")];

        assert_eq!(filter.apply(&first).1, 1);
        let (result, removed) = filter.apply(&second);
        assert_eq!(&*result, &[Named("7")]);
        assert_eq!(removed, 2);
    }

    #[test]
    fn test_filter_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ClusterFilter<'static>>();
        assert_send_sync::<FilterMode<'static>>();
    }

    #[test]
    fn test_works_over_references() {
        let owned = clusters();
        let refs: Vec<&Named> = owned.iter().collect();
        let (result, removed) = filter_cluster_list(&refs, &config(Some(&["4"]), None));

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].0, "4");
        assert_eq!(removed, 4);
    }
}
