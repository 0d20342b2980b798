//! The vault: share mint/burn, keeper and manager rebalances, fee
//! withdrawals and governance, over an AMM and a token ledger.
//!
//! Every mutating entry point runs inside [`Vault::atomically`]: it takes the
//! reentrancy lock, snapshots the vault and both collaborators, and restores
//! all of them if the operation fails.

use crate::accounting::{
    MintAmounts, amounts_for_shares, bootstrap_amounts_for_shares, bootstrap_mint_amounts,
    compute_mint_amounts, pro_rata, underlying_balances,
};
use crate::config::VaultConfig;
use crate::error::{VaultError, VaultResult};
use crate::events::{
    AdminParamsQueuedData, BurnedData, EventData, EventLog, FeesHarvestedData, FeesWithdrawnData,
    MintedData, OwnershipData, RebalanceData, RebalanceReason, ShareApprovalData,
    ShareTransferData,
};
use crate::fees::{Bucket, FeeBuckets, FeeSplit};
use crate::guard::{Operation, ReentrancyGuard};
use crate::params::{AdminParams, AdminParamsSlot};
use crate::position::{PositionLedger, validate_range};
use crate::rebalance::{
    check_heartbeat, check_slippage, plan_leftover_swap, swap_price_limit,
};
use crate::roles::{Role, Roles, authorize};
use crate::shares::ShareLedger;
use clmm_vault_domain::amm::{AmmError, ConcentratedPool};
use clmm_vault_domain::bps::{BPS_DENOMINATOR, BasisPoints};
use clmm_vault_domain::ledger::{TokenLedger, Transactional};
use clmm_vault_domain::math::liquidity_amounts::fit_liquidity;
use clmm_vault_domain::{Address, MathError, TokenPair, U256};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Who is calling and when.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallContext {
    /// Account the call is made from.
    pub caller: Address,
    /// Unix time in seconds.
    pub now: u64,
}

impl CallContext {
    /// Context for a call by `caller` at unix time `now`.
    pub fn new(caller: Address, now: u64) -> Self {
        Self { caller, now }
    }
}

/// Result of a mint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintReceipt {
    /// Shares credited to the recipient.
    pub shares: u128,
    /// Token0 pulled from the caller.
    pub amount0: u128,
    /// Token1 pulled from the caller.
    pub amount1: u128,
    /// Liquidity added to the position by the deposit.
    pub liquidity_added: u128,
}

/// Result of a burn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BurnReceipt {
    /// Shares burned from the caller.
    pub shares: u128,
    /// Token0 paid to the recipient.
    pub amount0: u128,
    /// Token1 paid to the recipient.
    pub amount1: u128,
    /// Liquidity removed from the position.
    pub liquidity_burned: u128,
}

/// Gross fees of one harvest and how they were split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Harvest {
    /// Token0 fees collected from the position.
    pub fees0: u128,
    /// Token1 fees collected from the position.
    pub fees1: u128,
    /// How the fees were divided.
    pub split: FeeSplit,
}

/// The leftover swap executed during a rebalance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapLeg {
    /// True when token0 was sold for token1.
    pub zero_for_one: bool,
    /// Input actually consumed by the pool.
    pub amount_in: u128,
    /// Output received from the pool.
    pub amount_out: u128,
}

/// Result of a rebalance or executive rebalance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebalanceReport {
    /// Lower tick before the rebalance.
    pub old_lower_tick: i32,
    /// Upper tick before the rebalance.
    pub old_upper_tick: i32,
    /// Lower tick after the rebalance.
    pub new_lower_tick: i32,
    /// Upper tick after the rebalance.
    pub new_upper_tick: i32,
    /// Liquidity withdrawn from the old range.
    pub old_liquidity: u128,
    /// Liquidity deployed in the new range.
    pub new_liquidity: u128,
    /// Fees harvested while withdrawing, if any.
    pub harvest: Option<Harvest>,
    /// Leftover swap, if one ran.
    pub swap: Option<SwapLeg>,
    /// Paid to the keeper from its bucket.
    pub keeper_fee: u128,
}

/// Point-in-time view of the vault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultSummary {
    /// Shares outstanding.
    pub total_supply: u128,
    /// Holders with a non-zero balance.
    pub holders: usize,
    /// Lower tick of the current range.
    pub lower_tick: i32,
    /// Upper tick of the current range.
    pub upper_tick: i32,
    /// Liquidity deployed in the range.
    pub liquidity: u128,
    /// Token0 held but not deployed.
    pub idle0: u128,
    /// Token1 held but not deployed.
    pub idle1: u128,
    /// Token0 owed to depositors at the live price.
    pub underlying0: u128,
    /// Token1 owed to depositors at the live price.
    pub underlying1: u128,
    /// Manager and keeper fee balances.
    pub fees: FeeBuckets,
    /// Live pool price.
    pub sqrt_price_x96: U256,
    /// Live pool tick.
    pub tick: i32,
    /// Timestamp of the last keeper rebalance.
    pub last_rebalance: u64,
}

/// State restored as a unit when an operation fails.
#[derive(Debug, Clone)]
struct VaultState {
    position: PositionLedger,
    shares: ShareLedger,
    fees: FeeBuckets,
    roles: Roles,
    params: AdminParamsSlot,
    last_rebalance: u64,
}

/// A pooled concentrated-liquidity position over pool `P`, settling
/// tokens through ledger `L`.
pub struct Vault<P, L> {
    address: Address,
    pair: TokenPair,
    state: VaultState,
    events: EventLog,
    guard: ReentrancyGuard,
    pool: P,
    tokens: L,
}

impl<P, L> Vault<P, L>
where
    P: ConcentratedPool + Transactional,
    L: TokenLedger + Transactional,
{
    /// Creates an empty vault. `now` seeds the last rebalance time.
    pub fn new(config: &VaultConfig, pool: P, tokens: L, now: u64) -> VaultResult<Self> {
        config.validate()?;
        validate_range(config.lower_tick, config.upper_tick, pool.tick_spacing())?;
        let pair = config.pair()?;

        info!(
            name = %config.name,
            pair = %pair,
            lower_tick = config.lower_tick,
            upper_tick = config.upper_tick,
            "Vault created"
        );

        Ok(Self {
            address: config.address,
            pair,
            state: VaultState {
                position: PositionLedger::new(config.lower_tick, config.upper_tick),
                shares: ShareLedger::new(config.name.clone(), config.symbol.clone()),
                fees: FeeBuckets::default(),
                roles: Roles::new(config.manager, config.keeper),
                params: AdminParamsSlot::new(config.params.clone()),
                last_rebalance: now,
            },
            events: EventLog::new(),
            guard: ReentrancyGuard::default(),
            pool,
            tokens,
        })
    }

    // ------------------------------------------------------------------
    // Read-only surface
    // ------------------------------------------------------------------

    /// Address holding the vault's tokens and position.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Underlying token pair.
    pub fn pair(&self) -> TokenPair {
        self.pair
    }

    /// Share token ledger.
    pub fn shares(&self) -> &ShareLedger {
        &self.state.shares
    }

    /// Shares outstanding.
    pub fn total_supply(&self) -> u128 {
        self.state.shares.total_supply()
    }

    /// Shares held by `holder`.
    pub fn balance_of(&self, holder: Address) -> u128 {
        self.state.shares.balance_of(holder)
    }

    /// Shares `spender` may move on behalf of `owner`.
    pub fn allowance(&self, owner: Address, spender: Address) -> u128 {
        self.state.shares.allowance(owner, spender)
    }

    /// Lower tick of the current range.
    pub fn lower_tick(&self) -> i32 {
        self.state.position.lower_tick
    }

    /// Upper tick of the current range.
    pub fn upper_tick(&self) -> i32 {
        self.state.position.upper_tick
    }

    /// Liquidity deployed in the current range.
    pub fn liquidity(&self) -> u128 {
        self.state.position.liquidity
    }

    /// Token balances held but not deployed, as `(token0, token1)`.
    pub fn idle_balances(&self) -> (u128, u128) {
        (self.state.position.idle0, self.state.position.idle1)
    }

    /// Manager and keeper fee balances.
    pub fn fee_buckets(&self) -> &FeeBuckets {
        &self.state.fees
    }

    /// Manager fee balance, as `(token0, token1)`.
    pub fn manager_balances(&self) -> (u128, u128) {
        (self.state.fees.manager0, self.state.fees.manager1)
    }

    /// Keeper fee balance, as `(token0, token1)`.
    pub fn keeper_balances(&self) -> (u128, u128) {
        (self.state.fees.keeper0, self.state.fees.keeper1)
    }

    /// Current manager, `None` once renounced.
    pub fn manager(&self) -> Option<Address> {
        self.state.roles.manager
    }

    /// Current keeper.
    pub fn keeper(&self) -> Address {
        self.state.roles.keeper
    }

    /// Admin params in force at `now`.
    pub fn admin_params(&self, now: u64) -> &AdminParams {
        self.state.params.resolve(now)
    }

    /// Queued params update and its activation time.
    pub fn pending_admin_params(&self) -> Option<(&AdminParams, u64)> {
        self.state.params.pending()
    }

    /// Unix time of the last keeper rebalance, or of creation.
    pub fn last_rebalance_timestamp(&self) -> u64 {
        self.state.last_rebalance
    }

    /// Every event recorded so far.
    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// The AMM collaborator.
    pub fn pool(&self) -> &P {
        &self.pool
    }

    /// The token ledger collaborator.
    pub fn tokens(&self) -> &L {
        &self.tokens
    }

    /// Direct access to the collaborators, for driving the market around
    /// the vault. Changes made here bypass the vault's accounting.
    pub fn collaborators_mut(&mut self) -> (&mut P, &mut L) {
        (&mut self.pool, &mut self.tokens)
    }

    /// Value held for depositors at the live price, with the params in
    /// force at `now` deciding the fee cut on uncollected fees.
    pub fn get_underlying_balances(&self, now: u64) -> VaultResult<(u128, u128)> {
        let slot = self.pool.slot()?;
        self.underlying_at(slot.sqrt_price_x96, self.state.params.resolve(now))
    }

    /// Inputs and shares of a mint bounded by `amount0_max` and
    /// `amount1_max`.
    pub fn get_mint_amounts(
        &self,
        amount0_max: u128,
        amount1_max: u128,
        now: u64,
    ) -> VaultResult<MintAmounts> {
        let slot = self.pool.slot()?;
        let supply = self.state.shares.total_supply();
        if supply == 0 {
            return bootstrap_mint_amounts(
                slot.sqrt_price_x96,
                &self.state.position,
                amount0_max,
                amount1_max,
            );
        }
        let (underlying0, underlying1) =
            self.underlying_at(slot.sqrt_price_x96, self.state.params.resolve(now))?;
        compute_mint_amounts(underlying0, underlying1, supply, amount0_max, amount1_max)
    }

    /// Point-in-time view of the vault at the live price.
    pub fn summary(&self, now: u64) -> VaultResult<VaultSummary> {
        let slot = self.pool.slot()?;
        let (underlying0, underlying1) =
            self.underlying_at(slot.sqrt_price_x96, self.state.params.resolve(now))?;
        let position = &self.state.position;
        Ok(VaultSummary {
            total_supply: self.state.shares.total_supply(),
            holders: self.state.shares.holders(),
            lower_tick: position.lower_tick,
            upper_tick: position.upper_tick,
            liquidity: position.liquidity,
            idle0: position.idle0,
            idle1: position.idle1,
            underlying0,
            underlying1,
            fees: self.state.fees.clone(),
            sqrt_price_x96: slot.sqrt_price_x96,
            tick: slot.tick,
            last_rebalance: self.state.last_rebalance,
        })
    }

    // ------------------------------------------------------------------
    // Depositor surface
    // ------------------------------------------------------------------

    /// Mints `shares` to `recipient`, pulling the rounded-up inputs from the
    /// caller and deploying all idle tokens.
    pub fn mint(
        &mut self,
        ctx: CallContext,
        shares: u128,
        recipient: Address,
    ) -> VaultResult<MintReceipt> {
        self.atomically(ctx, Operation::Mint, |vault| {
            vault.mint_inner(ctx, shares, recipient)
        })
    }

    /// Burns `shares` of the caller and pays the recipient its cut of the
    /// withdrawn principal and of the idle balances, rounded down.
    pub fn burn(
        &mut self,
        ctx: CallContext,
        shares: u128,
        recipient: Address,
    ) -> VaultResult<BurnReceipt> {
        self.atomically(ctx, Operation::Burn, |vault| {
            vault.burn_inner(ctx, shares, recipient)
        })
    }

    /// Moves `amount` shares from the caller to `to`.
    pub fn transfer(&mut self, ctx: CallContext, to: Address, amount: u128) -> VaultResult<()> {
        self.atomically(ctx, Operation::ShareTransfer, |vault| {
            vault.state.shares.transfer(ctx.caller, to, amount)?;
            vault.record_share_transfer(ctx, ctx.caller, to, amount);
            Ok(())
        })
    }

    /// Lets `spender` move up to `amount` of the caller's shares.
    pub fn approve(
        &mut self,
        ctx: CallContext,
        spender: Address,
        amount: u128,
    ) -> VaultResult<()> {
        self.atomically(ctx, Operation::ShareApproval, |vault| {
            vault.state.shares.approve(ctx.caller, spender, amount)?;
            vault.events.record(
                ctx.now,
                EventData::SharesApproved(ShareApprovalData {
                    owner: ctx.caller,
                    spender,
                    amount,
                }),
            );
            Ok(())
        })
    }

    /// Moves `amount` of `owner`'s shares to `to` against the caller's allowance.
    pub fn transfer_from(
        &mut self,
        ctx: CallContext,
        owner: Address,
        to: Address,
        amount: u128,
    ) -> VaultResult<()> {
        self.atomically(ctx, Operation::ShareTransfer, |vault| {
            vault
                .state
                .shares
                .transfer_from(ctx.caller, owner, to, amount)?;
            vault.record_share_transfer(ctx, owner, to, amount);
            Ok(())
        })
    }

    // ------------------------------------------------------------------
    // Keeper surface
    // ------------------------------------------------------------------

    /// Keeper rebalance on the current range.
    ///
    /// Harvests and withdraws everything, redeploys, swaps `swap_bps` of the
    /// dominant leftover within the hint band, redeploys again and pays the
    /// keeper `keeper_fee` of `fee_token` from its bucket.
    pub fn rebalance(
        &mut self,
        ctx: CallContext,
        price_limit_hint: U256,
        swap_bps: BasisPoints,
        keeper_fee: u128,
        fee_token: Address,
    ) -> VaultResult<RebalanceReport> {
        self.atomically(ctx, Operation::Rebalance, |vault| {
            vault.rebalance_inner(ctx, price_limit_hint, swap_bps, keeper_fee, fee_token)
        })
    }

    /// Pays `amount` of `token` from the manager bucket to the treasury.
    pub fn withdraw_manager_balance(
        &mut self,
        ctx: CallContext,
        amount: u128,
        token: Address,
    ) -> VaultResult<()> {
        self.atomically(ctx, Operation::WithdrawManagerBalance, |vault| {
            authorize(ctx.caller, Role::Keeper, &vault.state.roles)?;
            vault.state.params.settle(ctx.now);
            let treasury = vault
                .state
                .params
                .resolve(ctx.now)
                .treasury
                .ok_or(VaultError::TreasuryUnset)?;
            vault.withdraw_bucket(ctx, Bucket::Manager, amount, token, treasury)
        })
    }

    /// Pays `amount` of `token` from the keeper bucket to the keeper.
    pub fn withdraw_keeper_balance(
        &mut self,
        ctx: CallContext,
        amount: u128,
        token: Address,
    ) -> VaultResult<()> {
        self.atomically(ctx, Operation::WithdrawKeeperBalance, |vault| {
            authorize(ctx.caller, Role::Keeper, &vault.state.roles)?;
            let keeper = vault.state.roles.keeper;
            vault.withdraw_bucket(ctx, Bucket::Keeper, amount, token, keeper)
        })
    }

    // ------------------------------------------------------------------
    // Manager surface
    // ------------------------------------------------------------------

    /// Moves the position to `[new_lower_tick, new_upper_tick]`. No
    /// heartbeat gate; the slippage gate still applies.
    pub fn executive_rebalance(
        &mut self,
        ctx: CallContext,
        new_lower_tick: i32,
        new_upper_tick: i32,
        price_limit_hint: U256,
        swap_bps: BasisPoints,
    ) -> VaultResult<RebalanceReport> {
        self.atomically(ctx, Operation::ExecutiveRebalance, |vault| {
            vault.executive_rebalance_inner(
                ctx,
                new_lower_tick,
                new_upper_tick,
                price_limit_hint,
                swap_bps,
            )
        })
    }

    /// Queues `params` to take effect one heartbeat from now.
    pub fn update_admin_params(&mut self, ctx: CallContext, params: AdminParams) -> VaultResult<u64> {
        self.atomically(ctx, Operation::UpdateAdminParams, |vault| {
            authorize(ctx.caller, Role::Manager, &vault.state.roles)?;
            params.validate()?;
            let effective_at = vault.state.params.queue(params.clone(), ctx.now);

            info!(
                effective_at,
                heartbeat_seconds = params.heartbeat_seconds,
                manager_fee_bps = params.manager_fee_bps.0,
                keeper_fee_bps = params.keeper_fee_bps.0,
                "Admin params queued"
            );
            vault.events.record(
                ctx.now,
                EventData::AdminParamsQueued(AdminParamsQueuedData {
                    params,
                    effective_at,
                }),
            );
            Ok(effective_at)
        })
    }

    /// Hands the manager role to `new_manager`.
    pub fn transfer_ownership(&mut self, ctx: CallContext, new_manager: Address) -> VaultResult<()> {
        self.atomically(ctx, Operation::TransferOwnership, |vault| {
            authorize(ctx.caller, Role::Manager, &vault.state.roles)?;
            if new_manager.is_zero() {
                return Err(VaultError::ZeroAddress);
            }
            vault.state.roles.manager = Some(new_manager);
            vault.record_ownership(ctx, Some(new_manager));
            Ok(())
        })
    }

    /// Gives up the manager role for good. The treasury and manager fee are
    /// cleared and the manager bucket returns to depositors.
    pub fn renounce_ownership(&mut self, ctx: CallContext) -> VaultResult<()> {
        self.atomically(ctx, Operation::RenounceOwnership, |vault| {
            authorize(ctx.caller, Role::Manager, &vault.state.roles)?;
            vault.state.roles.manager = None;
            vault.state.params.update_all(|params| {
                params.treasury = None;
                params.manager_fee_bps = BasisPoints::ZERO;
            });
            let (manager0, manager1) = vault.state.fees.drain_manager();
            vault.state.position.credit_idle(manager0, manager1)?;
            vault.record_ownership(ctx, None);
            Ok(())
        })
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Runs `operation` under the reentrancy lock; on error restores the
    /// vault, the pool and the token ledger to their state at entry.
    fn atomically<T>(
        &mut self,
        ctx: CallContext,
        operation: Operation,
        f: impl FnOnce(&mut Self) -> VaultResult<T>,
    ) -> VaultResult<T> {
        self.guard.enter(operation)?;

        let state = self.state.clone();
        let pool = self.pool.snapshot();
        let tokens = self.tokens.snapshot();
        let events = self.events.len();

        let result = f(self);
        if let Err(error) = &result {
            warn!(
                operation = %operation,
                caller = ?ctx.caller,
                error = %error,
                "Operation rolled back"
            );
            self.state = state;
            self.pool.restore(pool);
            self.tokens.restore(tokens);
            self.events.truncate(events);
        }

        self.guard.exit();
        result
    }

    fn underlying_at(&self, sqrt_price_x96: U256, params: &AdminParams) -> VaultResult<(u128, u128)> {
        let position = &self.state.position;
        let (uncollected0, uncollected1) = if position.liquidity == 0 {
            (0, 0)
        } else {
            let snapshot =
                self.pool
                    .position(self.address, position.lower_tick, position.upper_tick)?;
            (snapshot.fees0, snapshot.fees1)
        };
        Ok(underlying_balances(
            sqrt_price_x96,
            position,
            uncollected0,
            uncollected1,
            params,
        )?)
    }

    fn mint_inner(
        &mut self,
        ctx: CallContext,
        shares: u128,
        recipient: Address,
    ) -> VaultResult<MintReceipt> {
        if shares == 0 {
            return Err(VaultError::InvalidShareAmount);
        }
        if recipient.is_zero() {
            return Err(VaultError::ZeroAddress);
        }
        self.state.params.settle(ctx.now);
        let params = self.state.params.resolve(ctx.now).clone();

        let supply = self.state.shares.total_supply();
        let requested = supply.checked_add(shares).ok_or(MathError::Overflow)?;
        if requested > params.max_total_supply {
            return Err(VaultError::SupplyCapExceeded {
                cap: params.max_total_supply,
                requested,
            });
        }

        let slot = self.pool.slot()?;
        let (amount0, amount1) = if supply == 0 {
            bootstrap_amounts_for_shares(slot.sqrt_price_x96, &self.state.position, shares)?
        } else {
            let (underlying0, underlying1) = self.underlying_at(slot.sqrt_price_x96, &params)?;
            amounts_for_shares(underlying0, underlying1, supply, shares)?
        };
        if amount0 == 0 && amount1 == 0 {
            return Err(VaultError::InvalidShareAmount);
        }

        self.pull(ctx.caller, amount0, amount1)?;
        self.state.position.credit_idle(amount0, amount1)?;
        let liquidity_added = self.deploy_idle(slot.sqrt_price_x96)?;
        self.state.shares.mint(recipient, shares)?;

        info!(
            minter = ?ctx.caller,
            recipient = ?recipient,
            shares,
            amount0,
            amount1,
            liquidity_added,
            "Shares minted"
        );
        self.events.record(
            ctx.now,
            EventData::Minted(MintedData {
                minter: ctx.caller,
                recipient,
                shares,
                amount0,
                amount1,
                liquidity_added,
            }),
        );

        Ok(MintReceipt {
            shares,
            amount0,
            amount1,
            liquidity_added,
        })
    }

    fn burn_inner(
        &mut self,
        ctx: CallContext,
        shares: u128,
        recipient: Address,
    ) -> VaultResult<BurnReceipt> {
        if shares == 0 {
            return Err(VaultError::InvalidShareAmount);
        }
        let available = self.state.shares.balance_of(ctx.caller);
        if available < shares {
            return Err(VaultError::InsufficientBalance {
                requested: shares,
                available,
            });
        }
        if recipient.is_zero() {
            return Err(VaultError::ZeroAddress);
        }
        self.state.params.settle(ctx.now);
        let params = self.state.params.resolve(ctx.now).clone();
        let supply = self.state.shares.total_supply();

        let liquidity_burned = pro_rata(self.state.position.liquidity, shares, supply)?;
        let (owed0, owed1) = if liquidity_burned > 0 {
            let (owed0, owed1, _) = self.withdraw_liquidity(liquidity_burned, &params, ctx.now)?;
            (owed0, owed1)
        } else {
            (0, 0)
        };

        // Idle now includes the depositors' share of any harvested fees.
        let idle_share0 = pro_rata(self.state.position.idle0, shares, supply)?;
        let idle_share1 = pro_rata(self.state.position.idle1, shares, supply)?;
        self.state.position.debit_idle(idle_share0, idle_share1)?;

        let amount0 = owed0.checked_add(idle_share0).ok_or(MathError::Overflow)?;
        let amount1 = owed1.checked_add(idle_share1).ok_or(MathError::Overflow)?;

        self.state.shares.burn(ctx.caller, shares)?;
        self.push(recipient, amount0, amount1)?;

        info!(
            owner = ?ctx.caller,
            recipient = ?recipient,
            shares,
            amount0,
            amount1,
            liquidity_burned,
            "Shares burned"
        );
        self.events.record(
            ctx.now,
            EventData::Burned(BurnedData {
                owner: ctx.caller,
                recipient,
                shares,
                amount0,
                amount1,
                liquidity_burned,
            }),
        );

        Ok(BurnReceipt {
            shares,
            amount0,
            amount1,
            liquidity_burned,
        })
    }

    fn rebalance_inner(
        &mut self,
        ctx: CallContext,
        price_limit_hint: U256,
        swap_bps: BasisPoints,
        keeper_fee: u128,
        fee_token: Address,
    ) -> VaultResult<RebalanceReport> {
        authorize(ctx.caller, Role::Keeper, &self.state.roles)?;
        self.state.params.settle(ctx.now);
        let params = self.state.params.resolve(ctx.now).clone();

        if let Err(error) = check_heartbeat(
            ctx.now,
            self.state.last_rebalance,
            params.heartbeat_seconds,
        ) {
            warn!(last_rebalance = self.state.last_rebalance, "Rebalance gated by heartbeat");
            return Err(error);
        }
        let slot = self.pool.slot()?;
        check_slippage(price_limit_hint, slot.sqrt_price_x96, params.slippage_bps)?;
        params.swap_policy.check(swap_bps)?;
        let fee_in_token0 = self
            .pair
            .side_of(fee_token)
            .ok_or(VaultError::UnknownToken(fee_token))?;

        let (lower, upper) = (self.state.position.lower_tick, self.state.position.upper_tick);
        let mut report = self.redeploy(lower, upper, price_limit_hint, swap_bps, &params, ctx.now)?;

        if keeper_fee > 0 {
            self.state
                .fees
                .withdraw(Bucket::Keeper, fee_in_token0, keeper_fee)?;
            self.push_token(fee_token, ctx.caller, keeper_fee)?;
        }
        report.keeper_fee = keeper_fee;
        self.state.last_rebalance = ctx.now;

        info!(
            lower_tick = report.new_lower_tick,
            upper_tick = report.new_upper_tick,
            old_liquidity = report.old_liquidity,
            new_liquidity = report.new_liquidity,
            keeper_fee,
            "Vault rebalanced"
        );
        self.record_rebalance(ctx, &report, RebalanceReason::Heartbeat);
        Ok(report)
    }

    fn executive_rebalance_inner(
        &mut self,
        ctx: CallContext,
        new_lower_tick: i32,
        new_upper_tick: i32,
        price_limit_hint: U256,
        swap_bps: BasisPoints,
    ) -> VaultResult<RebalanceReport> {
        authorize(ctx.caller, Role::Manager, &self.state.roles)?;
        self.state.params.settle(ctx.now);
        let params = self.state.params.resolve(ctx.now).clone();

        validate_range(new_lower_tick, new_upper_tick, self.pool.tick_spacing())?;
        if !swap_bps.is_valid() {
            return Err(VaultError::SwapAmountExceeded {
                requested_bps: swap_bps.0,
                allowed_bps: BPS_DENOMINATOR,
            });
        }
        if !swap_bps.is_zero() && params.swap_policy.is_disabled() {
            return Err(VaultError::SwapAmountExceeded {
                requested_bps: swap_bps.0,
                allowed_bps: 0,
            });
        }
        let slot = self.pool.slot()?;
        check_slippage(price_limit_hint, slot.sqrt_price_x96, params.slippage_bps)?;

        let report = self.redeploy(
            new_lower_tick,
            new_upper_tick,
            price_limit_hint,
            swap_bps,
            &params,
            ctx.now,
        )?;

        info!(
            old_lower_tick = report.old_lower_tick,
            old_upper_tick = report.old_upper_tick,
            new_lower_tick = report.new_lower_tick,
            new_upper_tick = report.new_upper_tick,
            new_liquidity = report.new_liquidity,
            "Executive rebalance"
        );
        self.record_rebalance(ctx, &report, RebalanceReason::Executive);
        Ok(report)
    }

    /// Withdraws everything, moves to the target range, deposits, swaps
    /// part of the leftover and deposits again.
    fn redeploy(
        &mut self,
        new_lower_tick: i32,
        new_upper_tick: i32,
        price_limit_hint: U256,
        swap_bps: BasisPoints,
        params: &AdminParams,
        now: u64,
    ) -> VaultResult<RebalanceReport> {
        let old_lower_tick = self.state.position.lower_tick;
        let old_upper_tick = self.state.position.upper_tick;
        let old_liquidity = self.state.position.liquidity;

        let mut harvest = None;
        if old_liquidity > 0 {
            let (owed0, owed1, harvested) = self.withdraw_liquidity(old_liquidity, params, now)?;
            self.state.position.credit_idle(owed0, owed1)?;
            harvest = harvested;
        }
        self.state
            .position
            .set_range(new_lower_tick, new_upper_tick)?;

        let slot = self.pool.slot()?;
        self.deploy_idle(slot.sqrt_price_x96)?;

        let (idle0, idle1) = self.idle_balances();
        let mut swap = None;
        if let Some(plan) = plan_leftover_swap(idle0, idle1, slot.sqrt_price_x96, swap_bps)? {
            let limit = swap_price_limit(
                price_limit_hint,
                slot.sqrt_price_x96,
                plan.zero_for_one,
                params.slippage_bps,
            );
            let outcome = self.pool.swap(
                &mut self.tokens,
                self.address,
                plan.zero_for_one,
                plan.amount_in,
                limit,
            )?;
            if outcome.amount_in > plan.amount_in {
                return Err(AmmError::SwapInputExceeded {
                    requested: plan.amount_in,
                    used: outcome.amount_in,
                }
                .into());
            }
            if plan.zero_for_one {
                self.state.position.debit_idle(outcome.amount_in, 0)?;
                self.state.position.credit_idle(0, outcome.amount_out)?;
            } else {
                self.state.position.debit_idle(0, outcome.amount_in)?;
                self.state.position.credit_idle(outcome.amount_out, 0)?;
            }
            debug!(
                zero_for_one = plan.zero_for_one,
                amount_in = outcome.amount_in,
                amount_out = outcome.amount_out,
                "Leftover swapped"
            );
            swap = Some(SwapLeg {
                zero_for_one: plan.zero_for_one,
                amount_in: outcome.amount_in,
                amount_out: outcome.amount_out,
            });

            let slot = self.pool.slot()?;
            self.deploy_idle(slot.sqrt_price_x96)?;
        }

        Ok(RebalanceReport {
            old_lower_tick,
            old_upper_tick,
            new_lower_tick,
            new_upper_tick,
            old_liquidity,
            new_liquidity: self.state.position.liquidity,
            harvest,
            swap,
            keeper_fee: 0,
        })
    }

    /// Deposits the largest liquidity idle balances can back at the current
    /// range. Returns the liquidity added.
    fn deploy_idle(&mut self, sqrt_price_x96: U256) -> VaultResult<u128> {
        let position = &self.state.position;
        let (sqrt_lower, sqrt_upper) = position.sqrt_ratios()?;
        let (idle0, idle1) = (position.idle0, position.idle1);
        let fitted = fit_liquidity(sqrt_price_x96, sqrt_lower, sqrt_upper, idle0, idle1)?;
        if fitted.liquidity == 0 {
            return Ok(0);
        }

        let (lower, upper) = (position.lower_tick, position.upper_tick);
        let (used0, used1) = self.pool.add_liquidity(
            &mut self.tokens,
            self.address,
            lower,
            upper,
            fitted.liquidity,
        )?;
        if used0 > idle0 || used1 > idle1 {
            return Err(AmmError::Overcharged {
                offered0: idle0,
                offered1: idle1,
                charged0: used0,
                charged1: used1,
            }
            .into());
        }
        self.state.position.debit_idle(used0, used1)?;
        self.state.position.add_liquidity(fitted.liquidity)?;

        debug!(
            liquidity = fitted.liquidity,
            used0,
            used1,
            lower_tick = lower,
            upper_tick = upper,
            "Idle balances deployed"
        );
        Ok(fitted.liquidity)
    }

    /// Removes `liquidity` from the position and splits the collected fees.
    /// Returns the principal owed, which the caller decides what to do with.
    fn withdraw_liquidity(
        &mut self,
        liquidity: u128,
        params: &AdminParams,
        now: u64,
    ) -> VaultResult<(u128, u128, Option<Harvest>)> {
        let (lower, upper) = (self.state.position.lower_tick, self.state.position.upper_tick);
        let removed =
            self.pool
                .remove_liquidity(&mut self.tokens, self.address, lower, upper, liquidity)?;
        self.state.position.remove_liquidity(liquidity)?;

        let harvest = self.split_fees(removed.fees0, removed.fees1, params, now)?;
        Ok((removed.owed0, removed.owed1, harvest))
    }

    /// Credits the buckets and returns the remainder to idle.
    fn split_fees(
        &mut self,
        fees0: u128,
        fees1: u128,
        params: &AdminParams,
        now: u64,
    ) -> VaultResult<Option<Harvest>> {
        if fees0 == 0 && fees1 == 0 {
            return Ok(None);
        }
        let split = FeeSplit::compute(fees0, fees1, params.manager_fee_bps, params.keeper_fee_bps)?;
        self.state.fees.credit(fees0, fees1, &split)?;
        self.state.position.credit_idle(split.net0, split.net1)?;

        debug!(
            fees0,
            fees1,
            manager0 = split.manager0,
            manager1 = split.manager1,
            keeper0 = split.keeper0,
            keeper1 = split.keeper1,
            "Fees harvested"
        );
        self.events.record(
            now,
            EventData::FeesHarvested(FeesHarvestedData {
                fees0,
                fees1,
                manager0: split.manager0,
                manager1: split.manager1,
                keeper0: split.keeper0,
                keeper1: split.keeper1,
            }),
        );
        Ok(Some(Harvest {
            fees0,
            fees1,
            split,
        }))
    }

    fn withdraw_bucket(
        &mut self,
        ctx: CallContext,
        bucket: Bucket,
        amount: u128,
        token: Address,
        recipient: Address,
    ) -> VaultResult<()> {
        let is_token0 = self
            .pair
            .side_of(token)
            .ok_or(VaultError::UnknownToken(token))?;
        self.state.fees.withdraw(bucket, is_token0, amount)?;
        self.push_token(token, recipient, amount)?;

        info!(bucket = ?bucket, token = ?token, amount, recipient = ?recipient, "Fees withdrawn");
        self.events.record(
            ctx.now,
            EventData::FeesWithdrawn(FeesWithdrawnData {
                bucket,
                token,
                amount,
                recipient,
            }),
        );
        Ok(())
    }

    fn pull(&mut self, from: Address, amount0: u128, amount1: u128) -> VaultResult<()> {
        if amount0 > 0 {
            self.tokens
                .transfer(self.pair.token0, from, self.address, amount0)?;
        }
        if amount1 > 0 {
            self.tokens
                .transfer(self.pair.token1, from, self.address, amount1)?;
        }
        Ok(())
    }

    fn push(&mut self, to: Address, amount0: u128, amount1: u128) -> VaultResult<()> {
        self.push_token(self.pair.token0, to, amount0)?;
        self.push_token(self.pair.token1, to, amount1)
    }

    fn push_token(&mut self, token: Address, to: Address, amount: u128) -> VaultResult<()> {
        if amount > 0 {
            self.tokens.transfer(token, self.address, to, amount)?;
        }
        Ok(())
    }

    fn record_share_transfer(&mut self, ctx: CallContext, from: Address, to: Address, amount: u128) {
        debug!(from = ?from, to = ?to, amount, "Shares transferred");
        self.events.record(
            ctx.now,
            EventData::SharesTransferred(ShareTransferData { from, to, amount }),
        );
    }

    fn record_ownership(&mut self, ctx: CallContext, new: Option<Address>) {
        info!(previous = ?ctx.caller, new = ?new, "Ownership transferred");
        self.events.record(
            ctx.now,
            EventData::OwnershipTransferred(OwnershipData {
                previous: Some(ctx.caller),
                new,
            }),
        );
    }

    fn record_rebalance(
        &mut self,
        ctx: CallContext,
        report: &RebalanceReport,
        reason: RebalanceReason,
    ) {
        self.events.record(
            ctx.now,
            EventData::Rebalanced(RebalanceData {
                old_lower_tick: report.old_lower_tick,
                old_upper_tick: report.old_upper_tick,
                new_lower_tick: report.new_lower_tick,
                new_upper_tick: report.new_upper_tick,
                old_liquidity: report.old_liquidity,
                new_liquidity: report.new_liquidity,
                swap: report
                    .swap
                    .map(|leg| (leg.zero_for_one, leg.amount_in, leg.amount_out)),
                reason,
            }),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::VaultEventType;
    use crate::params::SwapPolicy;
    use clmm_vault_domain::amm::RangeOracle;
    use clmm_vault_domain::fees::FeeTier;
    use clmm_vault_domain::math::Q96;
    use clmm_vault_simulation::prelude::*;

    const T0: u64 = 1_700_000_000;
    const DAY: u64 = 86_400;
    const FULL_LOWER: i32 = -887220;
    const FULL_UPPER: i32 = 887220;

    fn addr(n: u64) -> Address {
        Address::from_low_u64_be(n)
    }

    fn manager() -> Address {
        addr(0x01)
    }

    fn keeper() -> Address {
        addr(0x02)
    }

    fn alice() -> Address {
        addr(0x0a)
    }

    fn bob() -> Address {
        addr(0x0b)
    }

    fn trader() -> Address {
        addr(0x0c)
    }

    type TestVault = Vault<SimulatedPool, InMemoryTokenLedger>;

    fn setup(params: AdminParams) -> TestVault {
        let config = VaultConfig::default().with_params(params);
        let pair = config.pair().unwrap();
        let pool = SimulatedPool::new(addr(0x99), pair, FeeTier::MEDIUM, Q96).unwrap();
        let mut tokens = InMemoryTokenLedger::new();
        for holder in [alice(), bob(), trader()] {
            tokens.mint(pair.token0, holder, 1_000_000_000_000);
            tokens.mint(pair.token1, holder, 1_000_000_000_000);
        }
        Vault::new(&config, pool, tokens, T0).unwrap()
    }

    fn live_price(vault: &TestVault) -> U256 {
        vault.pool().slot().unwrap().sqrt_price_x96
    }

    #[test]
    fn test_first_mint_and_partial_burn_at_unit_price() {
        let mut vault = setup(AdminParams::default());
        let ctx = CallContext::new(alice(), T0);

        let quote = vault.get_mint_amounts(1_000, 1_000, T0).unwrap();
        assert_eq!(
            quote,
            MintAmounts {
                amount0: 1_000,
                amount1: 1_000,
                shares: 1_000
            }
        );

        let minted = vault.mint(ctx, 1_000, alice()).unwrap();
        assert_eq!((minted.amount0, minted.amount1), (1_000, 1_000));
        assert_eq!(minted.liquidity_added, 1_000);
        assert_eq!(vault.total_supply(), 1_000);
        assert_eq!(vault.liquidity(), 1_000);
        assert_eq!(vault.idle_balances(), (0, 0));

        let burned = vault.burn(ctx, 600, alice()).unwrap();
        assert_eq!(burned.liquidity_burned, 600);
        assert!(burned.amount0.abs_diff(600) <= 1);
        assert!(burned.amount1.abs_diff(600) <= 1);
        assert_eq!(vault.total_supply(), 400);
        assert_eq!(vault.liquidity(), 400);
        assert_eq!(vault.balance_of(alice()), 400);
    }

    #[test]
    fn test_zero_share_mint_and_burn_rejected() {
        let mut vault = setup(AdminParams::default());
        let ctx = CallContext::new(alice(), T0);
        assert_eq!(vault.mint(ctx, 0, alice()), Err(VaultError::InvalidShareAmount));
        assert_eq!(vault.burn(ctx, 0, alice()), Err(VaultError::InvalidShareAmount));
        assert_eq!(
            vault.burn(ctx, 1, alice()),
            Err(VaultError::InsufficientBalance {
                requested: 1,
                available: 0
            })
        );
    }

    #[test]
    fn test_supply_cap() {
        let mut vault = setup(AdminParams::default().with_max_total_supply(1_500));
        let ctx = CallContext::new(alice(), T0);
        vault.mint(ctx, 1_000, alice()).unwrap();
        assert_eq!(
            vault.mint(ctx, 501, alice()),
            Err(VaultError::SupplyCapExceeded {
                cap: 1_500,
                requested: 1_501
            })
        );
        assert!(vault.mint(ctx, 500, alice()).is_ok());
    }

    #[test]
    fn test_reentrant_call_is_blocked() {
        let mut vault = setup(AdminParams::default());
        vault.guard = ReentrancyGuard::InFlight(Operation::Rebalance);

        let ctx = CallContext::new(alice(), T0);
        assert_eq!(vault.mint(ctx, 1_000, alice()), Err(VaultError::ReentrancyBlocked));
        assert_eq!(vault.total_supply(), 0);

        vault.guard.exit();
        assert!(vault.mint(ctx, 1_000, alice()).is_ok());
        assert_eq!(vault.guard.in_flight(), None);
    }

    #[test]
    fn test_failed_mint_restores_everything() {
        let mut vault = setup(AdminParams::default());
        let carol = addr(0x0d);
        let token0 = vault.pair().token0;
        vault.collaborators_mut().1.mint(token0, carol, 5_000);

        // Token0 is pulled, token1 is missing.
        let ctx = CallContext::new(carol, T0);
        let err = vault.mint(ctx, 1_000, carol).unwrap_err();
        assert!(matches!(err, VaultError::TokenTransferFailed(_)));

        assert_eq!(vault.tokens().balance_of(token0, carol), 5_000);
        assert_eq!(vault.tokens().balance_of(token0, vault.address()), 0);
        assert_eq!(vault.total_supply(), 0);
        assert_eq!(vault.idle_balances(), (0, 0));
        assert!(vault.events().is_empty());
        assert_eq!(vault.pool().position_count(), 0);
        assert_eq!(vault.guard.in_flight(), None);
    }

    #[test]
    fn test_keeper_only_and_heartbeat_gate() {
        let mut vault = setup(AdminParams::default());
        vault.mint(CallContext::new(alice(), T0), 1_000_000, alice()).unwrap();
        let hint = live_price(&vault);
        let token0 = vault.pair().token0;

        assert_eq!(
            vault.rebalance(CallContext::new(alice(), T0 + DAY), hint, BasisPoints::ZERO, 0, token0),
            Err(VaultError::Unauthorized {
                caller: alice(),
                role: Role::Keeper
            })
        );
        assert_eq!(
            vault.rebalance(CallContext::new(keeper(), T0 + 10), hint, BasisPoints::ZERO, 0, token0),
            Err(VaultError::RebalanceTooSoon { remaining: DAY - 10 })
        );

        let report = vault
            .rebalance(CallContext::new(keeper(), T0 + DAY), hint, BasisPoints::ZERO, 0, token0)
            .unwrap();
        assert_eq!(report.old_liquidity, 1_000_000);
        assert_eq!(vault.last_rebalance_timestamp(), T0 + DAY);
        assert_eq!(
            vault.events().last().map(|e| e.event_type()),
            Some(VaultEventType::Rebalanced)
        );
    }

    #[test]
    fn test_rebalance_rejects_unknown_fee_token_and_excess_swap() {
        let mut vault = setup(AdminParams::default().with_swap_policy(SwapPolicy::Bounded {
            max_swap_bps: BasisPoints(1_000),
        }));
        vault.mint(CallContext::new(alice(), T0), 1_000_000, alice()).unwrap();
        let hint = live_price(&vault);
        let ctx = CallContext::new(keeper(), T0 + DAY);

        assert_eq!(
            vault.rebalance(ctx, hint, BasisPoints(1_001), 0, vault.pair().token0),
            Err(VaultError::SwapAmountExceeded {
                requested_bps: 1_001,
                allowed_bps: 1_000
            })
        );
        assert_eq!(
            vault.rebalance(ctx, hint, BasisPoints::ZERO, 0, addr(0x77)),
            Err(VaultError::UnknownToken(addr(0x77)))
        );
        assert_eq!(vault.last_rebalance_timestamp(), T0);
    }

    #[test]
    fn test_harvest_splits_fees_into_buckets() {
        let params = AdminParams::default()
            .with_fees(BasisPoints(1_000), BasisPoints(500))
            .with_treasury(addr(0x0e));
        let mut vault = setup(params);
        vault
            .mint(CallContext::new(alice(), T0), 1_000_000_000, alice())
            .unwrap();

        {
            let (pool, tokens) = vault.collaborators_mut();
            wash_trade(pool, tokens, trader(), 1_000_000, 3).unwrap();
        }
        let accrued = vault
            .pool()
            .position(vault.address(), FULL_LOWER, FULL_UPPER)
            .unwrap();
        assert!(accrued.fees0 > 0 && accrued.fees1 > 0);

        let expected_keeper0 = accrued.fees0 * 500 / 10_000;
        let token0 = vault.pair().token0;
        let hint = live_price(&vault);
        let report = vault
            .rebalance(
                CallContext::new(keeper(), T0 + DAY),
                hint,
                BasisPoints::ZERO,
                expected_keeper0,
                token0,
            )
            .unwrap();

        let harvest = report.harvest.unwrap();
        assert_eq!(harvest.fees0, accrued.fees0);
        assert_eq!(harvest.split.manager0, accrued.fees0 * 1_000 / 10_000);
        assert_eq!(harvest.split.keeper1, accrued.fees1 * 500 / 10_000);
        assert_eq!(vault.manager_balances(), (harvest.split.manager0, harvest.split.manager1));
        assert_eq!(vault.keeper_balances(), (0, harvest.split.keeper1));
        assert_eq!(vault.tokens().balance_of(token0, keeper()), expected_keeper0);

        // Manager fees go to the treasury, on the keeper's call.
        let manager0 = harvest.split.manager0;
        assert_eq!(
            vault.withdraw_manager_balance(CallContext::new(manager(), T0 + DAY), manager0, token0),
            Err(VaultError::Unauthorized {
                caller: manager(),
                role: Role::Keeper
            })
        );
        vault
            .withdraw_manager_balance(CallContext::new(keeper(), T0 + DAY), manager0, token0)
            .unwrap();
        assert_eq!(vault.tokens().balance_of(token0, addr(0x0e)), manager0);
        assert_eq!(vault.manager_balances().0, 0);
        assert_eq!(
            vault.withdraw_keeper_balance(CallContext::new(keeper(), T0 + DAY), 1, token0),
            Err(VaultError::InsufficientFeeBalance {
                requested: 1,
                available: 0
            })
        );
    }

    #[test]
    fn test_manager_withdrawal_needs_treasury() {
        let mut vault = setup(AdminParams::default());
        let token0 = vault.pair().token0;
        assert_eq!(
            vault.withdraw_manager_balance(CallContext::new(keeper(), T0), 0, token0),
            Err(VaultError::TreasuryUnset)
        );
    }

    #[test]
    fn test_executive_rebalance_moves_range() {
        let mut vault = setup(AdminParams::default());
        vault
            .mint(CallContext::new(alice(), T0), 1_000_000_000, alice())
            .unwrap();
        let hint = live_price(&vault);
        let ctx = CallContext::new(manager(), T0 + 60);

        assert_eq!(
            vault.executive_rebalance(ctx, -601, 600, hint, BasisPoints::ZERO),
            Err(VaultError::InvalidRange {
                lower: -601,
                upper: 600
            })
        );
        assert!(matches!(
            vault.executive_rebalance(CallContext::new(keeper(), T0 + 60), -600, 600, hint, BasisPoints::ZERO),
            Err(VaultError::Unauthorized { .. })
        ));

        let report = vault
            .executive_rebalance(ctx, -600, 600, hint, BasisPoints(5_000))
            .unwrap();
        assert_eq!((vault.lower_tick(), vault.upper_tick()), (-600, 600));
        assert_eq!((report.new_lower_tick, report.new_upper_tick), (-600, 600));
        // A narrower range backs the same tokens with more liquidity.
        assert!(report.new_liquidity > report.old_liquidity);
        assert_eq!(vault.last_rebalance_timestamp(), T0);
        assert_eq!(
            vault
                .pool()
                .position(vault.address(), -600, 600)
                .unwrap()
                .liquidity,
            vault.liquidity()
        );
    }

    #[test]
    fn test_slippage_gate_blocks_stale_hint() {
        let mut vault = setup(AdminParams::default().with_slippage(BasisPoints(100)));
        vault
            .mint(CallContext::new(alice(), T0), 1_000_000_000, alice())
            .unwrap();
        let stale = Q96 * U256::from(11u64) / U256::from(10u64);
        assert_eq!(
            vault.executive_rebalance(
                CallContext::new(manager(), T0),
                -600,
                600,
                stale,
                BasisPoints::ZERO
            ),
            Err(VaultError::SlippageExceeded { slippage_bps: 100 })
        );
    }

    #[test]
    fn test_keeper_rebalance_with_stale_hint_changes_nothing() {
        let mut vault = setup(AdminParams::default().with_slippage(BasisPoints(100)));
        vault
            .mint(CallContext::new(alice(), T0), 1_000_000_000, alice())
            .unwrap();
        let token0 = vault.pair().token0;
        let ctx = CallContext::new(keeper(), T0 + DAY);
        let events = vault.events().len();

        let stale = Q96 * U256::from(11u64) / U256::from(10u64);
        for hint in [stale, U256::MAX] {
            assert_eq!(
                vault.rebalance(ctx, hint, BasisPoints::ZERO, 0, token0),
                Err(VaultError::SlippageExceeded { slippage_bps: 100 })
            );
        }
        assert_eq!(vault.last_rebalance_timestamp(), T0);
        assert_eq!(vault.liquidity(), 1_000_000_000);
        assert_eq!(vault.events().len(), events);
        assert_eq!(vault.guard.in_flight(), None);

        // The lock was released, so a fresh hint goes through.
        let hint = live_price(&vault);
        assert!(vault.rebalance(ctx, hint, BasisPoints::ZERO, 0, token0).is_ok());
        assert_eq!(vault.last_rebalance_timestamp(), T0 + DAY);
    }

    #[test]
    fn test_admin_params_take_effect_after_heartbeat() {
        let mut vault = setup(AdminParams::default());
        let update = AdminParams::default().with_heartbeat(3_600);

        assert!(matches!(
            vault.update_admin_params(CallContext::new(keeper(), T0), update.clone()),
            Err(VaultError::Unauthorized { .. })
        ));

        let effective_at = vault
            .update_admin_params(CallContext::new(manager(), T0), update.clone())
            .unwrap();
        assert_eq!(effective_at, T0 + DAY);
        assert_eq!(vault.admin_params(T0 + DAY - 1).heartbeat_seconds, DAY);
        assert_eq!(vault.admin_params(T0 + DAY), &update);
        assert_eq!(vault.pending_admin_params(), Some((&update, T0 + DAY)));

        let invalid = AdminParams::default().with_fees(BasisPoints(9_000), BasisPoints(2_000));
        assert!(matches!(
            vault.update_admin_params(CallContext::new(manager(), T0), invalid),
            Err(VaultError::InvalidAdminParams(_))
        ));
    }

    #[test]
    fn test_ownership_transfer_and_renounce() {
        let mut vault = setup(AdminParams::default().with_treasury(addr(0x0e)));
        let new_manager = addr(0x05);

        assert_eq!(
            vault.transfer_ownership(CallContext::new(manager(), T0), Address::zero()),
            Err(VaultError::ZeroAddress)
        );
        vault
            .transfer_ownership(CallContext::new(manager(), T0), new_manager)
            .unwrap();
        assert_eq!(vault.manager(), Some(new_manager));

        vault.state.fees.manager0 = 7;
        vault
            .renounce_ownership(CallContext::new(new_manager, T0))
            .unwrap();
        assert_eq!(vault.manager(), None);
        assert_eq!(vault.manager_balances(), (0, 0));
        assert_eq!(vault.idle_balances(), (7, 0));
        assert_eq!(vault.admin_params(T0).treasury, None);
        assert!(vault.admin_params(T0).manager_fee_bps.is_zero());
        assert!(matches!(
            vault.renounce_ownership(CallContext::new(new_manager, T0)),
            Err(VaultError::Unauthorized { .. })
        ));
    }

    #[test]
    fn test_share_transfers_and_allowances() {
        let mut vault = setup(AdminParams::default());
        vault.mint(CallContext::new(alice(), T0), 1_000, alice()).unwrap();

        vault.transfer(CallContext::new(alice(), T0), bob(), 300).unwrap();
        assert_eq!(vault.balance_of(bob()), 300);

        vault.approve(CallContext::new(alice(), T0), bob(), 200).unwrap();
        assert_eq!(
            vault.transfer_from(CallContext::new(bob(), T0), alice(), bob(), 201),
            Err(VaultError::InsufficientAllowance {
                requested: 201,
                available: 200
            })
        );
        vault
            .transfer_from(CallContext::new(bob(), T0), alice(), bob(), 150)
            .unwrap();
        assert_eq!(vault.allowance(alice(), bob()), 50);
        assert_eq!(vault.balance_of(alice()), 550);
        assert_eq!(vault.total_supply(), 1_000);

        assert_eq!(vault.events().len(), 4);
        assert_eq!(
            vault.events().of_type(VaultEventType::SharesTransferred).count(),
            2
        );
    }
}
