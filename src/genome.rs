use ::rand::Rng;
use serde::{Deserialize, Serialize};

/// Number of observation inputs the decoded network takes.
pub const INPUTS: usize = 3;

/// Decoded weights and biases span [-WEIGHT_RANGE/2, WEIGHT_RANGE/2].
pub const WEIGHT_RANGE: f32 = 8.0;

/// Flat gene vector for a 3 -> hidden -> 1 feed-forward network.
///
/// Layout with `hidden > 0`:
/// `[input->hidden: hidden*INPUTS] [hidden biases: hidden] [hidden->out: hidden] [out bias: 1]`.
/// With `hidden == 0` the inputs feed the output directly: `[in->out: INPUTS] [out bias: 1]`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Genome {
    pub hidden: usize,
    /// Raw gene values, all in [0, 1].
    pub genes: Vec<f32>,
}

impl Genome {
    pub fn gene_len(hidden: usize) -> usize {
        if hidden == 0 {
            INPUTS + 1
        } else {
            hidden * INPUTS + hidden + hidden + 1
        }
    }

    pub fn random(hidden: usize, rng: &mut impl Rng) -> Self {
        let genes = (0..Self::gene_len(hidden))
            .map(|_| rng.gen_range(0.0..1.0))
            .collect();
        Self { hidden, genes }
    }

    /// Mutate this genome, returning a new child genome.
    pub fn mutate(&self, rate: f32, sigma: f32, rng: &mut impl Rng) -> Self {
        let mut child = self.clone();
        if sigma <= 0.0 {
            return child;
        }
        for gene in &mut child.genes {
            if rng.gen::<f32>() < rate {
                *gene += rng.gen_range(-sigma..sigma);
                *gene = gene.clamp(0.0, 1.0);
            }
        }
        child
    }

    /// Genome length matches its declared topology.
    pub fn is_well_formed(&self) -> bool {
        self.genes.len() == Self::gene_len(self.hidden)
            && self.genes.iter().all(|g| (0.0..=1.0).contains(g))
    }

    #[inline]
    pub fn decode(gene: f32) -> f32 {
        (gene - 0.5) * WEIGHT_RANGE
    }

    /// Weight from input `i` into hidden neuron `h` (or straight to the output when `hidden == 0`).
    pub fn input_weight(&self, h: usize, i: usize) -> f32 {
        Self::decode(self.genes[h * INPUTS + i])
    }

    pub fn hidden_bias(&self, h: usize) -> f32 {
        Self::decode(self.genes[self.hidden * INPUTS + h])
    }

    pub fn output_weight(&self, h: usize) -> f32 {
        Self::decode(self.genes[self.hidden * INPUTS + self.hidden + h])
    }

    pub fn output_bias(&self) -> f32 {
        Self::decode(self.genes[self.genes.len() - 1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn random_genomes_match_topology() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for hidden in [0, 1, 4, 9] {
            let g = Genome::random(hidden, &mut rng);
            assert_eq!(g.genes.len(), Genome::gene_len(hidden));
            assert!(g.is_well_formed());
        }
        assert_eq!(Genome::gene_len(0), 4);
        assert_eq!(Genome::gene_len(4), 21);
    }

    #[test]
    fn mutation_keeps_genes_in_unit_range() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let mut g = Genome::random(4, &mut rng);
        for _ in 0..200 {
            g = g.mutate(0.5, 0.4, &mut rng);
            assert!(g.is_well_formed());
        }
    }

    #[test]
    fn zero_rate_mutation_is_identity() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let g = Genome::random(2, &mut rng);
        assert_eq!(g.mutate(0.0, 0.3, &mut rng), g);
    }

    #[test]
    fn decode_maps_unit_interval_symmetrically() {
        assert_eq!(Genome::decode(0.0), -4.0);
        assert_eq!(Genome::decode(0.5), 0.0);
        assert_eq!(Genome::decode(1.0), 4.0);
    }
}
