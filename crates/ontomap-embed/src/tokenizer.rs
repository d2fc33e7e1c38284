//! Tokenizer setup for BERT checkpoints.

use std::path::Path;

use tokenizers::decoders::DecoderWrapper;
use tokenizers::models::wordpiece::WordPiece;
use tokenizers::models::ModelWrapper;
use tokenizers::normalizers::{BertNormalizer, NormalizerWrapper};
use tokenizers::pre_tokenizers::bert::BertPreTokenizer;
use tokenizers::pre_tokenizers::PreTokenizerWrapper;
use tokenizers::processors::bert::BertProcessing;
use tokenizers::processors::PostProcessorWrapper;
use tokenizers::{Model, Tokenizer, TokenizerBuilder, TokenizerImpl, TruncationParams};
use tracing::debug;

use crate::{EmbedError, Result};

/// Build a BERT tokenizer from a bare `vocab.txt`.
///
/// Same pipeline as the `tokenizer.json` of an uncased BERT checkpoint: BERT
/// normalization and pre-tokenization, WordPiece, then `[CLS] … [SEP]`.
pub(crate) fn from_vocab(path: &Path) -> Result<Tokenizer> {
    let wordpiece = WordPiece::from_file(&path.to_string_lossy())
        .unk_token("[UNK]".to_string())
        .continuing_subword_prefix("##".to_string())
        .max_input_chars_per_word(100)
        .build()
        .map_err(|e| EmbedError::Tokenizer(format!("WordPiece build: {e}")))?;
    debug!("Loaded vocab with {} tokens", wordpiece.get_vocab_size());

    let special = |token: &str| {
        wordpiece
            .token_to_id(token)
            .map(|id| (token.to_string(), id))
            .ok_or_else(|| EmbedError::Tokenizer(format!("{token} missing from {}", path.display())))
    };
    let processor = BertProcessing::new(special("[SEP]")?, special("[CLS]")?);

    let tokenizer: TokenizerImpl<
        ModelWrapper,
        NormalizerWrapper,
        PreTokenizerWrapper,
        PostProcessorWrapper,
        DecoderWrapper,
    > = TokenizerBuilder::new()
        .with_model(ModelWrapper::from(wordpiece))
        .with_normalizer(Some(NormalizerWrapper::from(BertNormalizer::default())))
        .with_pre_tokenizer(Some(PreTokenizerWrapper::from(BertPreTokenizer)))
        .with_post_processor(Some(PostProcessorWrapper::from(processor)))
        .build()?;
    Ok(Tokenizer::from(tokenizer))
}

/// Truncate inside the special tokens at `max_length` and leave padding to the caller.
pub(crate) fn prepare(tokenizer: &mut Tokenizer, max_length: usize) -> Result<()> {
    tokenizer.with_truncation(Some(TruncationParams {
        max_length,
        ..Default::default()
    }))?;
    tokenizer.with_padding(None);
    Ok(())
}
