//! ABI bindings for the wallet factory and per-user smart wallet contracts.

alloy::sol! {
    #[sol(rpc)]
    contract SmartWallet {
        function sendToken(address token, address to, uint256 amount) external;
        function getTokenBalance(address token) external view returns (uint256);
        function addGuardian(address guardian) external;
        function removeGuardian(address guardian) external;
        function getGuardians() external view returns (address[]);
        function getGuardianCount() external view returns (uint256);
        function owner() external view returns (address);
        function initiateRecovery(address newOwner) external;
        function confirmRecovery() external;
        function executeRecovery() external;
        function cancelRecovery() external;
        function guardians(address) external view returns (bool);
        function recoveryActive() external view returns (bool);

        event TokenSent(address indexed token, address indexed to, uint256 amount);
        event GuardianAdded(address indexed guardian);
        event GuardianRemoved(address indexed guardian);
    }

    #[sol(rpc)]
    contract WalletFactory {
        function createWallet() external returns (address);
        function getWallet(address user) external view returns (address);

        event WalletCreated(address indexed owner, address indexed wallet);
    }
}
