//! Bridge contract ABI (spec §6.1 — bit-exact wire contract). Declared with
//! alloy's `sol!` macro in the same idiom as the teacher's `Bridge`/`CL8YBridge`
//! bindings, trimmed to exactly the events and functions this spec names.

#![allow(clippy::too_many_arguments)]

use alloy::sol;

sol! {
    #[sol(rpc)]
    contract Bridge {
        /// `token = 0x00..00` denotes the native currency (spec §6.1).
        event Deposit(
            address indexed token,
            address indexed sender,
            address indexed recipient,
            uint256 amount,
            uint256 nonce,
            uint256 targetChainId
        );

        event Withdraw(
            address indexed token,
            address indexed recipient,
            uint256 amount,
            uint256 nonce,
            uint256 sourceChainId
        );

        function withdraw(
            address token,
            address recipient,
            uint256 amount,
            uint256 nonce,
            uint256 sourceChainId,
            bytes[] signatures
        ) external;

        function isProcessed(bytes32 messageHash) external view returns (bool);

        function supportedTokens(address token) external view returns (bool);
    }

    #[sol(rpc)]
    contract Erc20 {
        function balanceOf(address account) external view returns (uint256);
        function decimals() external view returns (uint8);
    }
}
