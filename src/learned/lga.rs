//! Learned genetic-algorithm building blocks
//!
//! Attention modules that replace the hand-designed operators of a GA:
//! parent sampling, survivor selection and per-member mutation strength.
//! Each takes per-member feature matrices (rows are members) and fixed
//! network weights.
//!
//! Reference: Lange et al. (2023). Discovering Attention-Based Genetic
//! Algorithms via Meta-Black-Box Optimization. GECCO.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::error::{ensure_dims, EvoResult, EvolutionError};
use crate::fitness::shaping::{range_norm, z_score};
use crate::learned::dense::{softmax, softmax_rows, Dense};
use crate::random::PrngKey;

/// Normalized age `tanh(age / generation - 1)`
///
/// `generation` is the current generation counter and must be positive.
pub fn tanh_age(age: &[f64], generation: f64) -> Vec<f64> {
    age.iter().map(|a| (a / generation - 1.0).tanh()).collect()
}

/// Multi-head scaled dot-product attention
///
/// Queries, keys and values are projected to `num_features` columns and
/// split into `num_heads` contiguous blocks. With more than one head the
/// concatenated head outputs are mixed by a final dense layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MultiHeadAttention {
    num_heads: usize,
    query: Dense,
    key: Dense,
    value: Dense,
    out: Option<Dense>,
}

impl MultiHeadAttention {
    pub fn new(
        key: PrngKey,
        in_features: usize,
        num_heads: usize,
        num_features: usize,
    ) -> EvoResult<Self> {
        if num_heads == 0 || num_features == 0 || num_features % num_heads != 0 {
            return Err(EvolutionError::Configuration(format!(
                "{num_features} features cannot be split over {num_heads} heads"
            )));
        }
        let [key_q, key_k, key_v, key_out] = key.split_n();
        Ok(Self {
            num_heads,
            query: Dense::lecun_normal(key_q, in_features, num_features),
            key: Dense::lecun_normal(key_k, in_features, num_features),
            value: Dense::lecun_normal(key_v, in_features, num_features),
            out: (num_heads > 1).then(|| Dense::lecun_normal(key_out, num_features, num_features)),
        })
    }

    pub fn in_features(&self) -> usize {
        self.query.in_dim()
    }

    pub fn num_features(&self) -> usize {
        self.query.out_dim()
    }

    pub fn num_heads(&self) -> usize {
        self.num_heads
    }

    pub fn head_dim(&self) -> usize {
        self.num_features() / self.num_heads
    }

    /// Attend every row of `x` over all rows of `x`
    pub fn self_attend(&self, x: &DMatrix<f64>) -> EvoResult<DMatrix<f64>> {
        self.cross_attend(x, x)
    }

    /// Attend every row of `queries` over the rows of `context`
    ///
    /// Returns a `queries.nrows() x num_features` matrix.
    pub fn cross_attend(
        &self,
        context: &DMatrix<f64>,
        queries: &DMatrix<f64>,
    ) -> EvoResult<DMatrix<f64>> {
        let q = self.query.forward(queries)?;
        let k = self.key.forward(context)?;
        let v = self.value.forward(context)?;

        let d = self.head_dim();
        let scale = (d as f64).sqrt();
        let mut heads = DMatrix::zeros(queries.nrows(), self.num_features());
        for h in 0..self.num_heads {
            let start = h * d;
            let logits = (q.columns(start, d) * k.columns(start, d).transpose()) / scale;
            let attended = softmax_rows(&logits) * v.columns(start, d);
            heads.columns_mut(start, d).copy_from(&attended);
        }

        match &self.out {
            Some(out) => out.forward(&heads),
            None => Ok(heads),
        }
    }
}

/// Parent sampling distribution from elite features
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SamplingAttention {
    attention: MultiHeadAttention,
    logits: Dense,
}

impl SamplingAttention {
    pub fn new(
        key: PrngKey,
        in_features: usize,
        num_heads: usize,
        hidden_dims: usize,
    ) -> EvoResult<Self> {
        let [key_att, key_out] = key.split_n();
        Ok(Self {
            attention: MultiHeadAttention::new(key_att, in_features, num_heads, hidden_dims)?,
            logits: Dense::lecun_normal(key_out, hidden_dims, 1),
        })
    }

    /// Probability of drawing each elite as a parent
    pub fn apply(&self, elite_features: &DMatrix<f64>) -> EvoResult<DVector<f64>> {
        if elite_features.nrows() == 0 {
            return Err(EvolutionError::EmptyPopulation);
        }
        let attended = self.attention.self_attend(elite_features)?;
        let logits = self.logits.forward(&attended)?;
        Ok(softmax(&logits.column(0).into_owned()))
    }
}

/// Survivor selection between offspring and the current elite
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SelectionAttention {
    attention: MultiHeadAttention,
    queries: Dense,
    keys: Dense,
}

impl SelectionAttention {
    pub fn new(
        key: PrngKey,
        in_features: usize,
        num_heads: usize,
        hidden_dims: usize,
    ) -> EvoResult<Self> {
        let [key_att, key_q, key_k] = key.split_n();
        Ok(Self {
            attention: MultiHeadAttention::new(key_att, in_features, num_heads, hidden_dims)?,
            queries: Dense::lecun_normal(key_q, hidden_dims, hidden_dims),
            keys: Dense::lecun_normal(key_k, in_features, hidden_dims),
        })
    }

    /// Replacement mask of shape `elites x offspring`
    ///
    /// Every elite row draws one categorical choice over the offspring plus
    /// a final "keep the elite" option with logit `1`. A row holds a single
    /// `1.0` at the offspring that replaces the elite, or only zeros when the
    /// elite survives.
    pub fn apply(
        &self,
        key: PrngKey,
        offspring_features: &DMatrix<f64>,
        elite_features: &DMatrix<f64>,
    ) -> EvoResult<DMatrix<f64>> {
        let num_offspring = offspring_features.nrows();
        let num_elites = elite_features.nrows();
        if num_offspring == 0 || num_elites == 0 {
            return Err(EvolutionError::EmptyPopulation);
        }

        let attended = self
            .attention
            .cross_attend(offspring_features, elite_features)?;
        let queries = self.queries.forward(&attended)?;
        let keys = self.keys.forward(offspring_features)?;
        let scores = (queries * keys.transpose()) / (self.keys.out_dim() as f64).sqrt();

        let mut mask = DMatrix::zeros(num_elites, num_offspring);
        for (row, row_key) in key.split(num_elites).into_iter().enumerate() {
            let logits = DVector::from_iterator(
                num_offspring + 1,
                scores.row(row).iter().copied().chain(std::iter::once(1.0)),
            );
            let choice = sample_categorical(row_key, &logits);
            if choice < num_offspring {
                mask[(row, choice)] = 1.0;
            }
        }
        Ok(mask)
    }
}

/// Per-member rescaling of mutation strengths
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MutationAttention {
    attention: MultiHeadAttention,
    log_var: Dense,
}

impl MutationAttention {
    /// `in_features` counts the caller's features only; the z-score and
    /// range-normalized mutation strengths are appended internally.
    pub fn new(
        key: PrngKey,
        in_features: usize,
        num_heads: usize,
        hidden_dims: usize,
    ) -> EvoResult<Self> {
        let [key_att, key_out] = key.split_n();
        Ok(Self {
            attention: MultiHeadAttention::new(key_att, in_features + 2, num_heads, hidden_dims)?,
            log_var: Dense::lecun_normal(key_out, hidden_dims, 1),
        })
    }

    /// `sigma · exp(log_var / 2)` with the log-variance predicted per member
    pub fn apply(&self, sigma: &[f64], features: &DMatrix<f64>) -> EvoResult<Vec<f64>> {
        ensure_dims(features.nrows(), sigma.len())?;
        if sigma.is_empty() {
            return Err(EvolutionError::EmptyPopulation);
        }

        let f = features.ncols();
        let z = z_score(sigma);
        let norm = range_norm(sigma, -1.0, 1.0);
        let inputs = DMatrix::from_fn(sigma.len(), f + 2, |i, j| match j {
            j if j < f => features[(i, j)],
            j if j == f => z[i],
            _ => norm[i],
        });

        let attended = self.attention.self_attend(&inputs)?;
        let log_var = self.log_var.forward(&attended)?;
        Ok(sigma
            .iter()
            .zip(log_var.column(0).iter())
            .map(|(s, lv)| s * (0.5 * lv).exp())
            .collect())
    }
}

/// Inverse-CDF draw from `softmax(logits)`
fn sample_categorical(key: PrngKey, logits: &DVector<f64>) -> usize {
    let probs = softmax(logits);
    let u = key.uniform();
    let mut cumulative = 0.0;
    for (i, p) in probs.iter().enumerate() {
        cumulative += p;
        if u < cumulative {
            return i;
        }
    }
    probs.len() - 1
}
