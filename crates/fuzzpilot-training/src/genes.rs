//! Gene vector operators for the genetic algorithm.
//!
//! Every operator works on plain `[f64]` chromosomes together with the per-gene bounds
//! they must respect. These operations are used by
//! [`GeneticAlgorithm`](crate::genetic::GeneticAlgorithm) to implement initialization,
//! crossover and mutation.
//!
//! # Operations
//!
//! - **Initialization**: [`random`] draws every gene uniformly from its range
//! - **Crossover**: [`single_point_crossover`] swaps tails after a random cut
//! - **Mutation**: [`mutate`] resets or perturbs genes with a per-gene probability
//!
//! # Design Decisions
//!
//! ## Single-Point Crossover
//!
//! Chromosomes are laid out slot by slot, so neighbouring genes usually belong to the same
//! fuzzy block. A single cut keeps most blocks intact in both children, which blend
//! crossovers would not.
//!
//! ## Bounded Mutation
//!
//! Both mutation operators keep genes inside their ranges. Reset mutation explores the
//! whole range; perturbation with a shrinking radius refines late in a run.

use rand::Rng;

/// A mutation operator resolved for one generation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MutationOp {
    Reset,
    /// Uniform noise of at most `radius × (max - min)`.
    Perturb { radius: f64 },
}

/// Draws a chromosome uniformly from `ranges`.
///
/// ```
/// use rand::SeedableRng as _;
/// use fuzzpilot_training::genes;
///
/// let mut rng = rand_pcg::Pcg64Mcg::seed_from_u64(1);
/// let genes = genes::random(&[(0.0, 1.0), (-2.0, 2.0)], &mut rng);
/// assert!((0.0..=1.0).contains(&genes[0]));
/// assert!((-2.0..=2.0).contains(&genes[1]));
/// ```
pub fn random<R>(ranges: &[(f64, f64)], rng: &mut R) -> Vec<f64>
where
    R: Rng + ?Sized,
{
    ranges
        .iter()
        .map(|&(min, max)| rng.random_range(min..=max))
        .collect()
}

/// Swaps the tails of two parents after a uniformly random cut.
///
/// The cut lies in `1..len`, so each child takes at least one gene from each parent.
/// Parents shorter than two genes are returned unchanged.
pub fn single_point_crossover<R>(a: &[f64], b: &[f64], rng: &mut R) -> (Vec<f64>, Vec<f64>)
where
    R: Rng + ?Sized,
{
    assert_eq!(a.len(), b.len());
    if a.len() < 2 {
        return (a.to_vec(), b.to_vec());
    }
    let cut = rng.random_range(1..a.len());
    let mut child1 = a[..cut].to_vec();
    child1.extend_from_slice(&b[cut..]);
    let mut child2 = b[..cut].to_vec();
    child2.extend_from_slice(&a[cut..]);
    (child1, child2)
}

/// Mutates each gene with probability `rate`, returning how many genes changed.
pub fn mutate<R>(
    genes: &mut [f64],
    ranges: &[(f64, f64)],
    rate: f64,
    op: MutationOp,
    rng: &mut R,
) -> usize
where
    R: Rng + ?Sized,
{
    assert_eq!(genes.len(), ranges.len());
    let mut mutated = 0;
    for (gene, &(min, max)) in genes.iter_mut().zip(ranges) {
        if rng.random::<f64>() >= rate {
            continue;
        }
        *gene = match op {
            MutationOp::Reset => rng.random_range(min..=max),
            MutationOp::Perturb { radius } => {
                let reach = radius * (max - min);
                (*gene + rng.random_range(-reach..=reach)).clamp(min, max)
            }
        };
        mutated += 1;
    }
    mutated
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_pcg::Pcg64Mcg;

    use super::*;

    #[test]
    fn test_crossover_swaps_tails() {
        let mut rng = Pcg64Mcg::seed_from_u64(3);
        let a = [0.0; 8];
        let b = [1.0; 8];
        for _ in 0..100 {
            let (c1, c2) = single_point_crossover(&a, &b, &mut rng);
            let cut = c1.iter().position(|g| *g == 1.0).unwrap();
            assert!((1..8).contains(&cut));
            assert!(c1[cut..].iter().all(|g| *g == 1.0));
            assert!(c2[..cut].iter().all(|g| *g == 1.0));
            assert!(c2[cut..].iter().all(|g| *g == 0.0));
        }
        let (c1, c2) = single_point_crossover(&[0.5], &[0.7], &mut rng);
        assert_eq!((c1, c2), (vec![0.5], vec![0.7]));
    }

    #[test]
    fn test_mutation_rate_extremes() {
        let mut rng = Pcg64Mcg::seed_from_u64(4);
        let ranges = vec![(0.0, 1.0); 50];
        let mut genes = vec![0.5; 50];
        assert_eq!(mutate(&mut genes, &ranges, 0.0, MutationOp::Reset, &mut rng), 0);
        assert!(genes.iter().all(|g| *g == 0.5));
        assert_eq!(mutate(&mut genes, &ranges, 1.0, MutationOp::Reset, &mut rng), 50);
        assert!(genes.iter().any(|g| *g != 0.5));
    }

    #[test]
    fn test_mutation_stays_in_range() {
        let mut rng = Pcg64Mcg::seed_from_u64(5);
        let ranges = [(0.0, 1.0), (-3.0, 3.0), (0.25, 0.5)];
        let mut genes = random(&ranges, &mut rng);
        for round in 0..500 {
            let op = if round % 2 == 0 {
                MutationOp::Reset
            } else {
                MutationOp::Perturb { radius: 0.8 }
            };
            mutate(&mut genes, &ranges, 0.5, op, &mut rng);
            for (gene, (min, max)) in genes.iter().zip(ranges) {
                assert!((min..=max).contains(gene));
            }
        }
    }

    #[test]
    fn test_perturbation_is_bounded_by_radius() {
        let mut rng = Pcg64Mcg::seed_from_u64(6);
        let ranges = vec![(0.0, 10.0); 100];
        let mut genes = vec![5.0; 100];
        mutate(&mut genes, &ranges, 1.0, MutationOp::Perturb { radius: 0.1 }, &mut rng);
        assert!(genes.iter().all(|g| (g - 5.0).abs() <= 1.0));
    }
}
