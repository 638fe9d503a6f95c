// ============================================================
// Layer 5 — Generational Training Loop
// ============================================================
// Trains several independently initialized candidate networks and
// keeps the one with the best validation accuracy — the survivor
// of the run. With a net this small, initialization luck matters,
// so a handful of restarts is cheaper than babysitting one run.
//
// Per generation: a full train + validation loop using Burn's
// DataLoader and Adam. Whenever an epoch beats the best validation
// accuracy seen so far (across generations), its weights are saved
// as the current artifact. Selection stops early once a candidate
// reaches the target accuracy.
//
// Key Burn 0.20 insight:
//   - Training uses TrainBackend (Autodiff<NdArray>) for gradients
//   - model.valid() returns the model on ValidBackend (NdArray)
//   - The validation batcher must also use ValidBackend
//   - argmax(1) returns [batch,1] so we flatten before .equal()
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use anyhow::Result;
use burn::{
    data::dataloader::DataLoaderBuilder,
    module::AutodiffModule,
    nn::loss::CrossEntropyLossConfig,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
};

use crate::application::train_use_case::TrainConfig;
use crate::data::{batcher::BoxBatcher, dataset::BoxDataset, template::SAMPLE_SIDE};
use crate::infra::checkpoint::{BestManifest, CheckpointManager};
use crate::infra::metrics::{EpochMetrics, MetricsLogger};
use crate::ml::model::{BoxNet, BoxNetConfig};

type TrainBackend = burn::backend::Autodiff<burn::backend::NdArray>;
type ValidBackend = burn::backend::NdArray;

pub fn run_training(
    cfg:           &TrainConfig,
    train_dataset: BoxDataset,
    val_dataset:   BoxDataset,
    ckpt_manager:  CheckpointManager,
    metrics:       MetricsLogger,
) -> Result<BestManifest> {
    let device = burn::backend::ndarray::NdArrayDevice::default();
    let input_size = (SAMPLE_SIDE * SAMPLE_SIDE) as usize;

    let model_cfg = BoxNetConfig::new(input_size, cfg.hidden_size, 2, cfg.dropout);

    // ── Data loaders (built once, iterated every epoch) ───────────────────────
    let train_batcher = BoxBatcher::<TrainBackend>::new(device.clone());
    let train_loader  = DataLoaderBuilder::new(train_batcher)
        .batch_size(cfg.batch_size)
        .shuffle(42)
        .num_workers(1)
        .build(train_dataset);

    // Validation on the inner backend — no autodiff overhead
    let val_batcher = BoxBatcher::<ValidBackend>::new(device.clone());
    let val_loader  = DataLoaderBuilder::new(val_batcher)
        .batch_size(cfg.batch_size)
        .num_workers(1)
        .build(val_dataset);

    let mut best: Option<BestManifest> = None;

    // ── Generation loop ───────────────────────────────────────────────────────
    'generations: for generation in 1..=cfg.generations {
        let mut model: BoxNet<TrainBackend> = model_cfg.init(&device);
        let optim_cfg = AdamConfig::new().with_epsilon(1e-8);
        let mut optim = optim_cfg.init();

        tracing::info!(
            "Generation {}/{}: fresh candidate ({} → {} → 2)",
            generation, cfg.generations, input_size, cfg.hidden_size,
        );

        for epoch in 1..=cfg.epochs {

            // ── Training phase ────────────────────────────────────────────────
            let mut train_loss_sum = 0.0f64;
            let mut train_batches  = 0usize;

            for batch in train_loader.iter() {
                let (loss, _) = model.forward_loss(batch.images, batch.targets);

                let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();
                train_loss_sum += loss_val;
                train_batches  += 1;

                // Backward pass + Adam update
                let grads = loss.backward();
                let grads = GradientsParams::from_grads(grads, &model);
                model = optim.step(cfg.lr, model, grads);
            }

            let avg_train_loss = if train_batches > 0 {
                train_loss_sum / train_batches as f64
            } else { f64::NAN };

            // ── Validation phase ──────────────────────────────────────────────
            // model.valid() → BoxNet<ValidBackend>, dropout disabled
            let model_valid = model.valid();

            let mut val_loss_sum  = 0.0f64;
            let mut val_batches   = 0usize;
            let mut correct       = 0usize;
            let mut total_samples = 0usize;

            for batch in val_loader.iter() {
                let logits = model_valid.forward(batch.images);

                let ce = CrossEntropyLossConfig::new().init(&logits.device());
                let batch_loss: f64 = ce
                    .forward(logits.clone(), batch.targets.clone())
                    .into_scalar().elem::<f64>();
                val_loss_sum += batch_loss;
                val_batches  += 1;

                // argmax(1) returns shape [batch, 1] — flatten to [batch]
                // before comparing with the [batch] target tensor
                let predicted = logits.argmax(1).flatten::<1>(0, 1);

                total_samples += batch.targets.dims()[0];
                let batch_correct: i64 = predicted
                    .equal(batch.targets)
                    .int().sum().into_scalar().elem::<i64>();
                correct += batch_correct as usize;
            }

            let avg_val_loss = if val_batches   > 0 { val_loss_sum / val_batches as f64 } else { f64::NAN };
            let val_acc      = if total_samples > 0 { correct as f64 / total_samples as f64 } else { 0.0 };

            println!(
                "Gen {:>2}/{} | Epoch {:>3}/{} | train_loss={:.4} | val_loss={:.4} | val_acc={:.1}%",
                generation, cfg.generations, epoch, cfg.epochs,
                avg_train_loss, avg_val_loss, val_acc * 100.0,
            );

            let epoch_metrics =
                EpochMetrics::new(generation, epoch, avg_train_loss, avg_val_loss, val_acc);
            metrics.log(&epoch_metrics)?;

            // ── Selection ─────────────────────────────────────────────────────
            let best_acc = best.as_ref().map(|m| m.val_accuracy).unwrap_or(f64::NEG_INFINITY);
            if epoch_metrics.is_improvement(best_acc) {
                let manifest = BestManifest {
                    generation,
                    batch_size:   cfg.batch_size,
                    lr:           cfg.lr,
                    epochs_run:   epoch,
                    val_accuracy: val_acc,
                };
                ckpt_manager.save_model(&model, &manifest)?;
                tracing::info!(
                    "New best candidate: generation {} epoch {} (val_acc {:.4})",
                    generation, epoch, val_acc,
                );
                best = Some(manifest);
            }

            if val_acc >= cfg.target_accuracy {
                tracing::info!(
                    "Target accuracy {:.4} reached — stopping selection",
                    cfg.target_accuracy,
                );
                break 'generations;
            }
        }
    }

    // Only reachable with zero generations or zero epochs.
    best.ok_or_else(|| anyhow::anyhow!("Training produced no candidate network"))
}
