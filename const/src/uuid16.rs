// Subset of the Bluetooth SIG assigned numbers ([Assigned Numbers] Section 3)
// needed to name GATT attributes. Values and names follow the published YAML
// repository.

uuid16_enum! {
    /// GATT services ([Assigned Numbers] Section 3.4).
    pub enum Service {
        GenericAccess = 0x1800 => "Generic Access",
        GenericAttribute = 0x1801 => "Generic Attribute",
        ImmediateAlert = 0x1802 => "Immediate Alert",
        LinkLoss = 0x1803 => "Link Loss",
        TxPower = 0x1804 => "Tx Power",
        CurrentTime = 0x1805 => "Current Time",
        ReferenceTimeUpdate = 0x1806 => "Reference Time Update",
        NextDstChange = 0x1807 => "Next DST Change",
        Glucose = 0x1808 => "Glucose",
        HealthThermometer = 0x1809 => "Health Thermometer",
        DeviceInformation = 0x180A => "Device Information",
        HeartRate = 0x180D => "Heart Rate",
        PhoneAlertStatus = 0x180E => "Phone Alert Status",
        Battery = 0x180F => "Battery",
        BloodPressure = 0x1810 => "Blood Pressure",
        AlertNotification = 0x1811 => "Alert Notification",
        HumanInterfaceDevice = 0x1812 => "Human Interface Device",
        ScanParameters = 0x1813 => "Scan Parameters",
        RunningSpeedAndCadence = 0x1814 => "Running Speed and Cadence",
        AutomationIo = 0x1815 => "Automation IO",
        CyclingSpeedAndCadence = 0x1816 => "Cycling Speed and Cadence",
        CyclingPower = 0x1818 => "Cycling Power",
        LocationAndNavigation = 0x1819 => "Location and Navigation",
        EnvironmentalSensing = 0x181A => "Environmental Sensing",
        BodyComposition = 0x181B => "Body Composition",
        UserData = 0x181C => "User Data",
        WeightScale = 0x181D => "Weight Scale",
        BondManagement = 0x181E => "Bond Management",
        ContinuousGlucoseMonitoring = 0x181F => "Continuous Glucose Monitoring",
        InternetProtocolSupport = 0x1820 => "Internet Protocol Support",
        IndoorPositioning = 0x1821 => "Indoor Positioning",
        PulseOximeter = 0x1822 => "Pulse Oximeter",
        HttpProxy = 0x1823 => "HTTP Proxy",
        TransportDiscovery = 0x1824 => "Transport Discovery",
        ObjectTransfer = 0x1825 => "Object Transfer",
        FitnessMachine = 0x1826 => "Fitness Machine",
    }
}

uuid16_enum! {
    /// GATT attribute types ([Assigned Numbers] Section 3.5).
    pub enum Declaration {
        PrimaryService = 0x2800 => "Primary Service",
        SecondaryService = 0x2801 => "Secondary Service",
        Include = 0x2802 => "Include",
        Characteristic = 0x2803 => "Characteristic",
    }
}

uuid16_enum! {
    /// GATT characteristic descriptors ([Assigned Numbers] Section 3.7).
    pub enum Descriptor {
        CharacteristicExtendedProperties = 0x2900 => "Characteristic Extended Properties",
        CharacteristicUserDescription = 0x2901 => "Characteristic User Description",
        ClientCharacteristicConfiguration = 0x2902 => "Client Characteristic Configuration",
        ServerCharacteristicConfiguration = 0x2903 => "Server Characteristic Configuration",
        CharacteristicPresentationFormat = 0x2904 => "Characteristic Presentation Format",
        CharacteristicAggregateFormat = 0x2905 => "Characteristic Aggregate Format",
        ValidRange = 0x2906 => "Valid Range",
        ExternalReportReference = 0x2907 => "External Report Reference",
        ReportReference = 0x2908 => "Report Reference",
        NumberOfDigitals = 0x2909 => "Number of Digitals",
        ValueTriggerSetting = 0x290A => "Value Trigger Setting",
        EnvironmentalSensingConfiguration = 0x290B => "Environmental Sensing Configuration",
        EnvironmentalSensingMeasurement = 0x290C => "Environmental Sensing Measurement",
        EnvironmentalSensingTriggerSetting = 0x290D => "Environmental Sensing Trigger Setting",
        TimeTriggerSetting = 0x290E => "Time Trigger Setting",
    }
}

uuid16_enum! {
    /// GATT characteristics ([Assigned Numbers] Section 3.8).
    pub enum Characteristic {
        DeviceName = 0x2A00 => "Device Name",
        Appearance = 0x2A01 => "Appearance",
        PeripheralPrivacyFlag = 0x2A02 => "Peripheral Privacy Flag",
        ReconnectionAddress = 0x2A03 => "Reconnection Address",
        PeripheralPreferredConnectionParameters = 0x2A04 => "Peripheral Preferred Connection Parameters",
        ServiceChanged = 0x2A05 => "Service Changed",
        AlertLevel = 0x2A06 => "Alert Level",
        TxPowerLevel = 0x2A07 => "Tx Power Level",
        DateTime = 0x2A08 => "Date Time",
        DayOfWeek = 0x2A09 => "Day of Week",
        DayDateTime = 0x2A0A => "Day Date Time",
        BatteryLevel = 0x2A19 => "Battery Level",
        BootKeyboardInputReport = 0x2A22 => "Boot Keyboard Input Report",
        SystemId = 0x2A23 => "System ID",
        ModelNumberString = 0x2A24 => "Model Number String",
        SerialNumberString = 0x2A25 => "Serial Number String",
        FirmwareRevisionString = 0x2A26 => "Firmware Revision String",
        HardwareRevisionString = 0x2A27 => "Hardware Revision String",
        SoftwareRevisionString = 0x2A28 => "Software Revision String",
        ManufacturerNameString = 0x2A29 => "Manufacturer Name String",
        BootKeyboardOutputReport = 0x2A32 => "Boot Keyboard Output Report",
        BootMouseInputReport = 0x2A33 => "Boot Mouse Input Report",
        HeartRateMeasurement = 0x2A37 => "Heart Rate Measurement",
        BodySensorLocation = 0x2A38 => "Body Sensor Location",
        HeartRateControlPoint = 0x2A39 => "Heart Rate Control Point",
        HidInformation = 0x2A4A => "HID Information",
        ReportMap = 0x2A4B => "Report Map",
        HidControlPoint = 0x2A4C => "HID Control Point",
        Report = 0x2A4D => "Report",
        ProtocolMode = 0x2A4E => "Protocol Mode",
        PnpId = 0x2A50 => "PnP ID",
        CentralAddressResolution = 0x2AA6 => "Central Address Resolution",
        ResolvablePrivateAddressOnly = 0x2AC9 => "Resolvable Private Address Only",
        ClientSupportedFeatures = 0x2B29 => "Client Supported Features",
        DatabaseHash = 0x2B2A => "Database Hash",
        ServerSupportedFeatures = 0x2B3A => "Server Supported Features",
    }
}
