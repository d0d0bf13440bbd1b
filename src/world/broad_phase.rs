use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Strategy used to find candidate body pairs before the narrow contact test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BroadPhaseKind {
    /// Test every pair. Fine for a few dozen bodies.
    AllPairs,
    /// Sort bounding intervals along x and only pair overlapping intervals.
    SweepAndPrune,
}

impl Default for BroadPhaseKind {
    fn default() -> Self {
        Self::SweepAndPrune
    }
}

/// Bounding sphere of one body as seen by the broad phase.
#[derive(Debug, Clone, Copy)]
pub struct Proxy {
    pub index: usize,
    pub center: Vec3,
    pub radius: f32,
}

/// Reusable pair finder. Keeps its scratch buffers between steps.
#[derive(Debug, Default)]
pub struct BroadPhase {
    kind: BroadPhaseKind,
    order: Vec<Proxy>,
    pairs: Vec<(usize, usize)>,
}

impl BroadPhase {
    pub fn new(kind: BroadPhaseKind) -> Self {
        Self { kind, order: Vec::new(), pairs: Vec::new() }
    }

    pub fn kind(&self) -> BroadPhaseKind {
        self.kind
    }

    /// Candidate pairs `(i, j)` with `i < j` whose bounding spheres overlap.
    pub fn find_pairs(&mut self, proxies: &[Proxy]) -> &[(usize, usize)] {
        self.pairs.clear();
        match self.kind {
            BroadPhaseKind::AllPairs => {
                for (n, a) in proxies.iter().enumerate() {
                    for b in &proxies[n + 1..] {
                        if spheres_overlap(a, b) {
                            self.pairs.push(ordered(a.index, b.index));
                        }
                    }
                }
            }
            BroadPhaseKind::SweepAndPrune => {
                self.order.clear();
                self.order.extend_from_slice(proxies);
                self.order
                    .sort_by(|a, b| (a.center.x - a.radius).total_cmp(&(b.center.x - b.radius)));
                for (n, a) in self.order.iter().enumerate() {
                    let max_x = a.center.x + a.radius;
                    for b in &self.order[n + 1..] {
                        if b.center.x - b.radius > max_x {
                            break;
                        }
                        if spheres_overlap(a, b) {
                            self.pairs.push(ordered(a.index, b.index));
                        }
                    }
                }
                // Keep resolution order independent of the sort.
                self.pairs.sort_unstable();
            }
        }
        &self.pairs
    }
}

fn spheres_overlap(a: &Proxy, b: &Proxy) -> bool {
    let reach = a.radius + b.radius;
    a.center.distance_squared(b.center) < reach * reach
}

fn ordered(a: usize, b: usize) -> (usize, usize) {
    if a < b { (a, b) } else { (b, a) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scattered() -> Vec<Proxy> {
        (0..40)
            .map(|i| {
                let f = i as f32;
                Proxy {
                    index: i,
                    center: Vec3::new((f * 1.7) % 6.0, (f * 0.9) % 4.0, (f * 2.3) % 5.0),
                    radius: 0.6,
                }
            })
            .collect()
    }

    #[test]
    fn strategies_agree() {
        let proxies = scattered();
        let mut all = BroadPhase::new(BroadPhaseKind::AllPairs);
        let mut sap = BroadPhase::new(BroadPhaseKind::SweepAndPrune);
        let mut expected = all.find_pairs(&proxies).to_vec();
        expected.sort_unstable();
        assert!(!expected.is_empty());
        assert_eq!(sap.find_pairs(&proxies), expected.as_slice());
    }

    #[test]
    fn separated_spheres_produce_no_pairs() {
        let proxies = [
            Proxy { index: 0, center: Vec3::ZERO, radius: 0.5 },
            Proxy { index: 1, center: Vec3::new(2.0, 0.0, 0.0), radius: 0.5 },
        ];
        let mut sap = BroadPhase::new(BroadPhaseKind::SweepAndPrune);
        assert!(sap.find_pairs(&proxies).is_empty());
    }
}
