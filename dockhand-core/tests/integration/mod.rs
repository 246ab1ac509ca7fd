mod cache_behavior;
mod hub_flow;
mod pool_flow;
