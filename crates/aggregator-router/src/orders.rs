//! Materialization of fills into settlement-ready orders.

use crate::path::PathContext;
use aggregator_types::{
	AggregatorError, Address, ClassifiedOrders, Fill, FillData, MaterializedOrder, OrderKind,
	Result, Side, Venue, U256,
};

/// (maker, taker) tokens of the overall trade. Selling, the taker pays the
/// input token; buying, the roles flip.
pub fn maker_taker_tokens(context: &PathContext) -> (Address, Address) {
	match context.side {
		Side::Sell => (context.output_token, context.input_token),
		Side::Buy => (context.input_token, context.output_token),
	}
}

fn maker_taker_amounts(side: Side, input: U256, output: U256) -> (U256, U256) {
	match side {
		Side::Sell => (output, input),
		Side::Buy => (input, output),
	}
}

/// Materializes a path's fills into orders, in fill order. Two-hop fills
/// expand into their two constituent legs, first hop first.
pub fn create_orders(fills: &[Fill], context: &PathContext) -> Result<Vec<MaterializedOrder>> {
	let (maker_token, taker_token) = maker_taker_tokens(context);
	let mut orders = Vec::with_capacity(fills.len());
	for fill in fills {
		match fill.kind {
			OrderKind::Resting(_) => orders.push(create_resting_order(fill, context.side)?),
			OrderKind::TwoHop => {
				let [first, second] = create_two_hop_orders(fill, context, maker_token, taker_token)?;
				orders.push(first);
				orders.push(second);
			}
			OrderKind::Bridge => {
				let (maker_amount, taker_amount) =
					maker_taker_amounts(context.side, fill.input, fill.output);
				orders.push(MaterializedOrder {
					kind: OrderKind::Bridge,
					venue: fill.venue,
					maker_token,
					taker_token,
					maker_amount,
					taker_amount,
					fill_data: fill.fill_data.clone(),
					source_path_id: fill.source_path_id,
				});
			}
		}
	}
	Ok(orders)
}

fn create_resting_order(fill: &Fill, side: Side) -> Result<MaterializedOrder> {
	let FillData::RestingOrder(order) = &fill.fill_data else {
		return Err(AggregatorError::Other(anyhow::anyhow!(
			"resting fill is missing its order data"
		)));
	};
	let (maker_amount, taker_amount) = maker_taker_amounts(side, fill.input, fill.output);
	Ok(MaterializedOrder {
		kind: fill.kind,
		venue: Venue::Native,
		maker_token: order.maker_token,
		taker_token: order.taker_token,
		maker_amount,
		taker_amount,
		fill_data: fill.fill_data.clone(),
		source_path_id: fill.source_path_id,
	})
}

/// Expands a two-hop fill into two bridge legs around the intermediate
/// token. The trade-amount constraint lives on the outer side of each leg;
/// the inner (intermediate) amounts use zero/max sentinels so settlement
/// passes whatever the first leg produced straight into the second.
fn create_two_hop_orders(
	fill: &Fill,
	context: &PathContext,
	maker_token: Address,
	taker_token: Address,
) -> Result<[MaterializedOrder; 2]> {
	let Some(hops) = fill.fill_data.as_two_hop() else {
		return Err(AggregatorError::Other(anyhow::anyhow!(
			"two-hop fill is missing its hop data"
		)));
	};
	let (first_input, first_output, second_input, second_output) = match context.side {
		Side::Sell => (fill.input, U256::ZERO, U256::MAX, fill.output),
		Side::Buy => (U256::ZERO, fill.output, fill.input, U256::MAX),
	};
	let (first_maker, first_taker) = maker_taker_amounts(context.side, first_input, first_output);
	let (second_maker, second_taker) = maker_taker_amounts(context.side, second_input, second_output);
	Ok([
		MaterializedOrder {
			kind: OrderKind::TwoHop,
			venue: hops.first_hop.venue,
			maker_token: hops.intermediate_token,
			taker_token,
			maker_amount: first_maker,
			taker_amount: first_taker,
			fill_data: FillData::Custom(hops.first_hop.fill_data.clone()),
			source_path_id: fill.source_path_id,
		},
		MaterializedOrder {
			kind: OrderKind::TwoHop,
			venue: hops.second_hop.venue,
			maker_token,
			taker_token: hops.intermediate_token,
			maker_amount: second_maker,
			taker_amount: second_taker,
			fill_data: FillData::Custom(hops.second_hop.fill_data.clone()),
			source_path_id: fill.source_path_id,
		},
	])
}

/// Groups materialized orders by settlement kind, pairing consecutive
/// two-hop legs back together.
pub fn classify_orders(orders: &[MaterializedOrder]) -> ClassifiedOrders {
	let mut classified = ClassifiedOrders::default();
	let mut pending_hop: Option<MaterializedOrder> = None;
	for order in orders {
		match order.kind {
			OrderKind::Resting(_) => classified.resting.push(order.clone()),
			OrderKind::Bridge => classified.bridge.push(order.clone()),
			OrderKind::TwoHop => match pending_hop.take() {
				Some(first) => classified.two_hop.push([first, order.clone()]),
				None => pending_hop = Some(order.clone()),
			},
		}
	}
	classified
}
