// Swap-graph wire format
// Lazy, single-pass decoders for the single, sequential and split encodings,
// the split-plan validator, and matching encoders for callers building graphs
//
// Numan Thabit 2025 Nov

use crate::errors::{Result, RouterError, SplitViolation};
use crate::types::{read_address, Address, TransferType, ADDRESS_LEN};

/// Splits are parts of this denominator; `0` means "whatever remains".
pub const SPLIT_DENOMINATOR: u32 = 0x00FF_FFFF;

const LEN_PREFIX: usize = 2;
/// token_in (1) + token_out (1) + split (3) + action (1)
const SPLIT_HEADER: usize = 6;

/// One decoded step: the executor to dispatch to and its opaque payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapStep<'a> {
    pub executor: Address,
    pub protocol_data: &'a [u8],
}

impl<'a> SwapStep<'a> {
    /// `[executor:20][protocolData]`
    pub fn decode(bytes: &'a [u8]) -> Result<Self> {
        if bytes.len() < ADDRESS_LEN {
            return Err(RouterError::InvalidDataLength);
        }
        Ok(Self {
            executor: read_address(bytes)?,
            protocol_data: &bytes[ADDRESS_LEN..],
        })
    }
}

/// One leg of a split plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitLeg<'a> {
    pub token_in: u8,
    pub token_out: u8,
    pub split: u32,
    /// Transfer type the leg's executor is allowed to request.
    pub action: TransferType,
    pub step: SwapStep<'a>,
}

impl<'a> SplitLeg<'a> {
    fn decode(chunk: &'a [u8]) -> Result<Self> {
        if chunk.len() < SPLIT_HEADER + ADDRESS_LEN {
            return Err(RouterError::InvalidParameterLength);
        }
        let split = u32::from_be_bytes([0, chunk[2], chunk[3], chunk[4]]);
        Ok(Self {
            token_in: chunk[0],
            token_out: chunk[1],
            split,
            action: TransferType::try_from(chunk[5])?,
            step: SwapStep::decode(&chunk[SPLIT_HEADER..])?,
        })
    }
}

/// Cursor over `[len:u16][body:len]` chunks. Consumes its input; after the
/// first error it yields nothing more.
#[derive(Debug, Clone)]
struct Chunks<'a> {
    remaining: &'a [u8],
}

impl<'a> Chunks<'a> {
    fn next_chunk(&mut self) -> Option<Result<&'a [u8]>> {
        if self.remaining.is_empty() {
            return None;
        }
        if self.remaining.len() < LEN_PREFIX {
            self.remaining = &[];
            return Some(Err(RouterError::InvalidDataLength));
        }
        let len = u16::from_be_bytes([self.remaining[0], self.remaining[1]]) as usize;
        let body = &self.remaining[LEN_PREFIX..];
        if len > body.len() {
            self.remaining = &[];
            return Some(Err(RouterError::InvalidDataLength));
        }
        let (chunk, rest) = body.split_at(len);
        self.remaining = rest;
        Some(Ok(chunk))
    }
}

/// Steps of a sequential swap, decoded one at a time.
#[derive(Debug, Clone)]
pub struct SequentialSwaps<'a> {
    chunks: Chunks<'a>,
}

impl<'a> SequentialSwaps<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            chunks: Chunks { remaining: bytes },
        }
    }
}

impl<'a> Iterator for SequentialSwaps<'a> {
    type Item = Result<SwapStep<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        let chunk = match self.chunks.next_chunk()? {
            Ok(c) => c,
            Err(e) => return Some(Err(e)),
        };
        if chunk.len() < ADDRESS_LEN {
            self.chunks.remaining = &[];
            return Some(Err(RouterError::InvalidParameterLength));
        }
        Some(SwapStep::decode(chunk))
    }
}

/// Legs of a split swap, decoded one at a time.
#[derive(Debug, Clone)]
pub struct SplitSwaps<'a> {
    chunks: Chunks<'a>,
}

impl<'a> SplitSwaps<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            chunks: Chunks { remaining: bytes },
        }
    }
}

impl<'a> Iterator for SplitSwaps<'a> {
    type Item = Result<SplitLeg<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        let chunk = match self.chunks.next_chunk()? {
            Ok(c) => c,
            Err(e) => return Some(Err(e)),
        };
        let leg = SplitLeg::decode(chunk);
        if leg.is_err() {
            self.chunks.remaining = &[];
        }
        Some(leg)
    }
}

/// Check a split plan's structure without executing it.
///
/// Token 0 is the input. A token may only be spent once some leg produced it,
/// its non-zero splits must stay below the whole, and exactly one remainder
/// leg (split 0) must close it as its last spending leg.
pub fn validate_split_plan(swaps: &[u8], n_tokens: u8) -> Result<()> {
    if n_tokens < 2 {
        return Err(RouterError::InvalidSplit {
            index: 0,
            violation: SplitViolation::TooFewTokens(n_tokens),
        });
    }
    let n = n_tokens as usize;
    let mut produced = vec![false; n];
    let mut closed = vec![false; n];
    let mut weights = vec![0u64; n];
    produced[0] = true;

    let mut count = 0usize;
    for (index, leg) in SplitSwaps::new(swaps).enumerate() {
        let leg = leg?;
        count += 1;
        let fail = |violation| Err(RouterError::InvalidSplit { index, violation });

        for t in [leg.token_in, leg.token_out] {
            if t >= n_tokens {
                return fail(SplitViolation::TokenIndexOutOfRange { index: t, n_tokens });
            }
        }
        let (tin, tout) = (leg.token_in as usize, leg.token_out as usize);
        if tin == tout {
            return fail(SplitViolation::SameTokenInAndOut(leg.token_in));
        }
        if !produced[tin] {
            return fail(SplitViolation::TokenNotYetProduced(leg.token_in));
        }
        if closed[tin] {
            return fail(SplitViolation::LegAfterRemainder(leg.token_in));
        }
        if leg.action == TransferType::TransferFrom && tin != 0 {
            return fail(SplitViolation::PullFromIntermediate(leg.token_in));
        }
        if leg.split == 0 {
            closed[tin] = true;
        } else {
            weights[tin] += u64::from(leg.split);
            if weights[tin] >= u64::from(SPLIT_DENOMINATOR) {
                return fail(SplitViolation::WeightsExceedWhole(leg.token_in));
            }
        }
        produced[tout] = true;
    }

    if count == 0 {
        return Err(RouterError::InvalidSplit {
            index: 0,
            violation: SplitViolation::Empty,
        });
    }
    if let Some(t) = (0..n).find(|&t| weights[t] > 0 && !closed[t]) {
        return Err(RouterError::InvalidSplit {
            index: count,
            violation: SplitViolation::MissingRemainder(t as u8),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Encoders
// ---------------------------------------------------------------------------

pub fn encode_single(executor: Address, protocol_data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(ADDRESS_LEN + protocol_data.len());
    out.extend_from_slice(executor.as_slice());
    out.extend_from_slice(protocol_data);
    out
}

fn push_chunk(out: &mut Vec<u8>, chunk: &[u8]) -> Result<()> {
    let len = u16::try_from(chunk.len()).map_err(|_| RouterError::InvalidParameterLength)?;
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(chunk);
    Ok(())
}

pub fn encode_sequential(steps: &[(Address, Vec<u8>)]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    for (executor, data) in steps {
        push_chunk(&mut out, &encode_single(*executor, data))?;
    }
    Ok(out)
}

/// Owned description of a split leg for encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitLegPlan {
    pub token_in: u8,
    pub token_out: u8,
    pub split: u32,
    pub action: TransferType,
    pub executor: Address,
    pub protocol_data: Vec<u8>,
}

pub fn encode_split(legs: &[SplitLegPlan]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    for leg in legs {
        if leg.split > SPLIT_DENOMINATOR {
            return Err(RouterError::InvalidParameterLength);
        }
        let mut chunk = Vec::with_capacity(SPLIT_HEADER + ADDRESS_LEN + leg.protocol_data.len());
        chunk.push(leg.token_in);
        chunk.push(leg.token_out);
        chunk.extend_from_slice(&leg.split.to_be_bytes()[1..]);
        chunk.push(leg.action.as_byte());
        chunk.extend_from_slice(&encode_single(leg.executor, &leg.protocol_data));
        push_chunk(&mut out, &chunk)?;
    }
    Ok(out)
}

/// Fraction `parts / 100` of the split denominator, for building plans by percent.
pub fn percent(parts: u32) -> u32 {
    (u64::from(SPLIT_DENOMINATOR) * u64::from(parts.min(100)) / 100) as u32
}
